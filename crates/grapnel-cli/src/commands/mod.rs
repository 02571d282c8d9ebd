//! One handler per subcommand, grouped by concern.

pub(crate) mod transfers;
pub(crate) mod watch;
