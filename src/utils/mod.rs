pub mod fs;
pub mod watch;
