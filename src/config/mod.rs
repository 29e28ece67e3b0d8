//! # Configuration file.
//!
//! TOML format, one table per program:
//!
//! ```toml
//! name = "demo"
//! server = "127.0.0.1:8080"
//!
//! [programs.db]
//! command = "postgres -D /data"
//! startsecs = 5
//!
//! [programs.web]
//! command = "./web"
//! autorestart = true
//! startretries = 3
//! restart_on = "failure"
//! after = "db"
//! ```
//!
//! | field          | default | meaning                                        |
//! |----------------|---------|------------------------------------------------|
//! | `command`      | -       | run through the configured shell               |
//! | `autorestart`  | `false` | restart after exit                             |
//! | `startretries` | absent  | restart budget; absent or negative = unlimited |
//! | `startsecs`    | `0`     | grace period before a child counts as running  |
//! | `after`        | none    | predecessor key                                |
//! | `restart_on`   | `exit`  | `exit` (any exit) or `failure` (non-zero)      |

mod file;

pub use file::{ConfigFile, ProgramConfig, parse_addr};
