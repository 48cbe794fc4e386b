// Command line: flags first, interactive prompts for whatever is missing.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::Parser;

use crate::error::InputError;

#[derive(Parser, Debug)]
#[command(name = "utilization-report", version, about = "Monthly infrastructure utilization report", long_about = None)]
pub struct CliArgs {
    /// Path to the TOML config file. Without it, `CONFIG_FILE` is read, then config.toml.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Authentication profile(s). Repeat the flag or pass a comma-separated list.
    #[arg(long = "profile", value_delimiter = ',')]
    pub profiles: Vec<String>,

    /// Report month as MM-YYYY.
    #[arg(long)]
    pub month: Option<String>,
}

/// Comma-separated profile list, blanks dropped.
pub fn split_profiles(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

fn prompt(
    question: &str,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> std::io::Result<String> {
    write!(output, "{question}")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Profiles from the flags, or prompted when none were given.
pub fn resolve_profiles(
    given: &[String],
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> anyhow::Result<Vec<String>> {
    let profiles: Vec<String> = given.iter().flat_map(|p| split_profiles(p)).collect();
    if !profiles.is_empty() {
        return Ok(profiles);
    }
    let answer = prompt(
        "Enter the profile name(s), separated by commas: ",
        input,
        output,
    )?;
    let profiles = split_profiles(&answer);
    anyhow::ensure!(!profiles.is_empty(), InputError::NoProfile);
    Ok(profiles)
}

/// Month from the flag, or prompted. Not validated here.
pub fn resolve_month(
    given: Option<&str>,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> anyhow::Result<String> {
    match given {
        Some(m) => Ok(m.trim().to_string()),
        None => Ok(prompt("Enter the month and year (MM-YYYY): ", input, output)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_accept_repeats_and_commas() {
        let args = CliArgs::parse_from([
            "utilization-report",
            "--profile",
            "prod,stage",
            "--profile",
            "dev",
            "--month",
            "05-2024",
        ]);
        assert_eq!(args.profiles, vec!["prod", "stage", "dev"]);
        assert_eq!(args.month.as_deref(), Some("05-2024"));
    }

    #[test]
    fn config_flag_is_only_the_explicit_path() {
        let args = CliArgs::parse_from(["utilization-report"]);
        assert!(args.config.is_none());
        let args = CliArgs::parse_from(["utilization-report", "--config", "ops/report.toml"]);
        assert_eq!(args.config, Some(PathBuf::from("ops/report.toml")));
    }

    #[test]
    fn prompts_when_flags_missing() {
        let mut input = "prod , stage\n".as_bytes();
        let mut out = Vec::new();
        let profiles = resolve_profiles(&[], &mut input, &mut out).unwrap();
        assert_eq!(profiles, vec!["prod", "stage"]);
        assert!(String::from_utf8(out).unwrap().contains("profile name"));

        let mut input = "13-2024\n".as_bytes();
        let month = resolve_month(None, &mut input, &mut Vec::<u8>::new()).unwrap();
        assert_eq!(month, "13-2024");
    }

    #[test]
    fn empty_profile_answer_is_rejected() {
        let mut input = " , \n".as_bytes();
        assert!(resolve_profiles(&[], &mut input, &mut Vec::<u8>::new()).is_err());
    }
}
