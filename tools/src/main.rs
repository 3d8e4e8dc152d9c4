//! compartment-sim: command-line runner for the compartment simulator.
//!
//! Usage:
//!   compartment-sim --model sir -s 175000 -i 10 -b 0.4 -g 0.04
//!   compartment-sim --config zombie.json --format csv --header
//!   compartment-sim --model sqeir --init Exposed=250 --rate recovery_rate=0.1
//!
//! One line per simulated month goes to stderr; the banner and summary go
//! to stdout.

use anyhow::{bail, Result};
use clap::Parser;
use compartment_core::{
    config::SimConfig,
    engine::Simulation,
    models::{ModelKind, INFECTION_RATE, RECOVERY_RATE},
    output::{LineWriter, OutputFormat},
    rounding::RoundingPolicy,
    types::{Quantity, Year},
};
use std::io::{self, BufWriter};

#[derive(Parser, Debug)]
#[command(name = "compartment-sim")]
#[command(about = "Barrier-synchronized compartmental population simulator", long_about = None)]
#[command(version)]
struct Cli {
    /// Built-in model: sir, influenza, sqeir, zombie, diclonius
    #[arg(short, long)]
    model: Option<ModelKind>,

    /// JSON configuration file; flags override its values
    #[arg(short, long)]
    config: Option<String>,

    /// First simulated year
    #[arg(long)]
    start_year: Option<Year>,

    /// The run stops when this year is reached
    #[arg(long)]
    end_year: Option<Year>,

    /// Total population; the first compartment receives the remainder
    #[arg(short, long, value_parser = parse_non_negative)]
    population: Option<Quantity>,

    /// Initial Susceptible count
    #[arg(short = 's', long, value_parser = parse_non_negative)]
    susceptible: Option<Quantity>,

    /// Initial Infected count
    #[arg(short = 'i', long, value_parser = parse_non_negative)]
    infected: Option<Quantity>,

    /// Infection rate (beta)
    #[arg(short = 'b', long, value_parser = parse_non_negative)]
    infection_rate: Option<f64>,

    /// Recovery rate (gamma)
    #[arg(short = 'g', long, value_parser = parse_non_negative)]
    recovery_rate: Option<f64>,

    /// Initial value for any compartment, e.g. --init Zombies=25
    #[arg(long = "init", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    initial: Vec<(String, f64)>,

    /// Any rate coefficient, e.g. --rate death_rate=0.3
    #[arg(long = "rate", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    rates: Vec<(String, f64)>,

    /// Rounding applied to every proposal before clamping: exact, nearest, truncate
    #[arg(long)]
    rounding: Option<RoundingPolicy>,

    /// Output format: human, csv, json
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Print a column header before the first CSV line
    #[arg(long)]
    header: bool,

    /// Suppress the banner and summary on stdout
    #[arg(short, long)]
    quiet: bool,

    /// List built-in models and exit
    #[arg(long)]
    list_models: bool,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    if cli.list_models {
        return list_models();
    }

    let config = build_config(&cli)?;
    let sim = Simulation::from_config(&config)?;

    if !cli.quiet {
        println!("compartment-sim");
        println!("  model:     {}", config.model);
        println!("  years:     {} -> {}", config.start_year, config.end_year);
        println!("  steps:     {}", sim.total_steps());
        println!("  threads:   {}", sim.model().len() + 1);
        println!("  rounding:  {}", config.rounding);
        for (name, value) in config.rates.iter() {
            println!("  {name:<22} {value}");
        }
        println!();
    }

    let mut writer = LineWriter::new(BufWriter::new(io::stderr()), config.format);
    if cli.header {
        writer = writer.with_header(&sim.model().compartment_names());
    }
    let report = sim.run(writer)?;

    if !cli.quiet {
        println!("=== RUN SUMMARY ===");
        println!("  steps run:   {}", report.steps);
        println!(
            "  final date:  year {} month {}",
            report.final_snapshot.year,
            report.final_snapshot.month + 1
        );
        for c in &report.final_snapshot.compartments {
            println!("  {:<12} {}", c.name, c.value);
        }
        println!("  total:       {}", report.final_snapshot.total());
    }
    Ok(())
}

fn build_config(cli: &Cli) -> Result<SimConfig> {
    let mut config = match (&cli.config, cli.model) {
        (Some(path), model) => {
            let config = SimConfig::load(path)?;
            if let Some(model) = model {
                if model != config.model {
                    bail!("--model {model} conflicts with model '{}' in {path}", config.model);
                }
            }
            config
        }
        (None, model) => SimConfig::for_model(model.unwrap_or(ModelKind::Sir))?,
    };

    if let Some(year) = cli.start_year {
        config.start_year = year;
    }
    if let Some(year) = cli.end_year {
        config.end_year = year;
    }
    if let Some(value) = cli.susceptible {
        config.set_initial("Susceptible", value)?;
    }
    if let Some(value) = cli.infected {
        config.set_initial("Infected", value)?;
    }
    for (name, value) in &cli.initial {
        config.set_initial(name.clone(), *value)?;
    }
    if let Some(value) = cli.infection_rate {
        config.set_rate(INFECTION_RATE, value)?;
    }
    if let Some(value) = cli.recovery_rate {
        config.set_rate(RECOVERY_RATE, value)?;
    }
    for (name, value) in &cli.rates {
        config.set_rate(name.clone(), *value)?;
    }
    if let Some(population) = cli.population {
        config.apply_population(population)?;
    }
    if let Some(rounding) = cli.rounding {
        config.rounding = rounding;
    }
    if let Some(format) = cli.format {
        config.format = format;
    }

    config.validate()?;
    log::debug!("resolved config: {}", serde_json::to_string(&config)?);
    Ok(config)
}

fn list_models() -> Result<()> {
    for kind in ModelKind::ALL {
        let model = kind.build()?;
        let defaults = kind.defaults()?;
        println!("{kind}");
        println!("  compartments: {}", model.compartment_names().join(", "));
        println!("  rates:        {}", model.rate_names().join(", "));
        println!("  years:        {} -> {}", defaults.start_year, defaults.end_year);
    }
    Ok(())
}

fn parse_non_negative(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{s}' is not a number"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("'{s}' must be a finite, non-negative number"));
    }
    Ok(value)
}

fn parse_assignment(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing name in '{s}'"));
    }
    Ok((name.to_string(), parse_non_negative(value)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_negative_parser_rejects_bad_input() {
        assert_eq!(parse_non_negative("0.4"), Ok(0.4));
        assert!(parse_non_negative("-1").is_err());
        assert!(parse_non_negative("abc").is_err());
        assert!(parse_non_negative("inf").is_err());
    }

    #[test]
    fn assignment_parser_splits_name_and_value() {
        assert_eq!(parse_assignment("Zombies=25"), Ok(("Zombies".to_string(), 25.0)));
        assert!(parse_assignment("Zombies").is_err());
        assert!(parse_assignment("=3").is_err());
        assert!(parse_assignment("Dead=-3").is_err());
    }

    #[test]
    fn flags_override_model_defaults() {
        let cli = Cli::parse_from([
            "compartment-sim", "-s", "1000", "-i", "0", "-g", "0.2", "--end-year", "2025",
        ]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.model, ModelKind::Sir);
        assert_eq!(config.initial["Susceptible"], 1000.0);
        assert_eq!(config.initial["Infected"], 0.0);
        assert_eq!(config.rates.read(RECOVERY_RATE), Some(0.2));
        assert_eq!(config.end_year, 2025);
    }

    #[test]
    fn negative_flag_value_is_a_parse_error() {
        assert!(Cli::try_parse_from(["compartment-sim", "-i", "-5"]).is_err());
        assert!(Cli::try_parse_from(["compartment-sim", "-b", "x"]).is_err());
    }

    #[test]
    fn unknown_compartment_for_model_fails_before_running() {
        let cli = Cli::parse_from(["compartment-sim", "--model", "diclonius", "-i", "3"]);
        assert!(build_config(&cli).is_err());
    }

    #[test]
    fn init_flags_after_a_file_population_keep_the_total() {
        let path = std::env::temp_dir()
            .join(format!("compartment-sim-population-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "model": "sir", "population": 1000 }"#).unwrap();
        let cli = Cli::parse_from([
            "compartment-sim", "-c", path.to_str().unwrap(), "-i", "25", "--init", "Recovered=5",
        ]);
        let config = build_config(&cli);
        std::fs::remove_file(&path).unwrap();

        let initial = config.unwrap().resolved_initial().unwrap();
        assert_eq!(initial["Susceptible"], 970.0);
        assert_eq!(initial["Infected"], 25.0);
        assert_eq!(initial.values().sum::<Quantity>(), 1000.0);
    }
}
