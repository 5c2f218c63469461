// Copyright (C) 2026 the sharded-gateway contributors. This program is free
// software: you can redistribute it and/or modify it under the terms of the
// GNU General Public License as published by the Free Software Foundation,
// version 3.
//
// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General
// Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program. If not, see <https://www.gnu.org/licenses/>.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "gateway-daemon", about = "Sharded-gateway coordinator process")]
pub struct Args {
    /// Path to the JSON config file layered under a `GATEWAY_`-prefixed
    /// environment overlay.
    #[arg(short, long, value_name = "PATH", help = "config file path", default_value = "config.json")]
    pub config: String,

    /// Raises the log level to DEBUG regardless of `RUST_LOG`.
    #[arg(long, help = "enable debug logging")]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_config_json_and_no_debug() {
        let args = Args::parse_from(["gateway-daemon"]);
        assert_eq!(args.config, "config.json");
        assert!(!args.debug);
    }

    #[test]
    fn accepts_short_config_flag_and_debug() {
        let args = Args::parse_from(["gateway-daemon", "-c", "other.json", "--debug"]);
        assert_eq!(args.config, "other.json");
        assert!(args.debug);
    }
}
