use std::path::PathBuf;

use clap::Parser;

/// Compile a double-byte charset mapping table into its binary lookup form.
#[derive(Debug, Parser)]
#[command(name = "dbcsmap", about, version)]
pub struct Cli {
    /// Mapping table to read (`0x<bytes> U+<code point> # comment` lines)
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Binary table to write; replaced atomically on success
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_two_positionals() {
        let cli = Cli::try_parse_from(["dbcsmap", "jis0213.map", "jis0213.dat"]).unwrap();
        assert_eq!(cli.input, PathBuf::from("jis0213.map"));
        assert_eq!(cli.output, PathBuf::from("jis0213.dat"));
    }

    #[test]
    fn rejects_missing_output() {
        assert!(Cli::try_parse_from(["dbcsmap", "jis0213.map"]).is_err());
    }

    #[test]
    fn rejects_extra_positional() {
        assert!(Cli::try_parse_from(["dbcsmap", "a", "b", "c"]).is_err());
    }
}
