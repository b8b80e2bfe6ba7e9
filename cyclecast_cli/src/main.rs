use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use cyclecast_core::export;
use cyclecast_core::*;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "cyclecast")]
#[command(about = "Cycle tracking and forecasting", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// User whose records are read and written
    #[arg(long, global = true)]
    user: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage period records
    Period {
        #[command(subcommand)]
        action: PeriodAction,
    },

    /// Manage ovulation records
    Ovulation {
        #[command(subcommand)]
        action: OvulationAction,
    },

    /// Forecast the next period or ovulation
    Predict {
        #[command(subcommand)]
        target: PredictTarget,
    },

    /// Show cycle statistics over the full history
    Stats,

    /// Export records to CSV
    Export {
        /// Directory for periods.csv and ovulations.csv (default: <data-dir>/export)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Import records from CSV. Rows whose id is already recorded for the
    /// user are skipped, so re-importing an export adds nothing.
    Import {
        #[arg(long)]
        periods: Option<PathBuf>,

        #[arg(long)]
        ovulations: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum PeriodAction {
    /// Record a period
    Add {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD); omit for an ongoing period
        #[arg(long)]
        end: Option<String>,

        /// Flow intensity label
        #[arg(long)]
        flow: Option<String>,

        #[arg(long)]
        symptoms: Option<String>,
    },

    /// List periods, newest first
    List,

    /// Show one period
    Show { id: Uuid },

    /// Change fields of a period
    Update {
        id: Uuid,

        #[arg(long)]
        start: Option<String>,

        #[arg(long, conflicts_with = "clear_end")]
        end: Option<String>,

        /// Mark the period as ongoing again
        #[arg(long)]
        clear_end: bool,

        #[arg(long, conflicts_with = "clear_flow")]
        flow: Option<String>,

        #[arg(long)]
        clear_flow: bool,

        #[arg(long, conflicts_with = "clear_symptoms")]
        symptoms: Option<String>,

        #[arg(long)]
        clear_symptoms: bool,
    },

    /// Delete a period
    Delete { id: Uuid },
}

#[derive(Subcommand)]
enum OvulationAction {
    /// Record an ovulation
    Add {
        /// Ovulation date (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Basal body temperature
        #[arg(long)]
        temperature: Option<f64>,

        /// Cervical mucus (dry, sticky, creamy, watery, egg-white)
        #[arg(long, value_parser = parse_mucus)]
        mucus: Option<String>,

        #[arg(long)]
        symptoms: Option<String>,
    },

    /// List ovulation records, newest first
    List,

    /// Show one ovulation record
    Show { id: Uuid },

    /// Change fields of an ovulation record
    Update {
        id: Uuid,

        #[arg(long)]
        date: Option<String>,

        #[arg(long, conflicts_with = "clear_temperature")]
        temperature: Option<f64>,

        #[arg(long)]
        clear_temperature: bool,

        #[arg(long, value_parser = parse_mucus, conflicts_with = "clear_mucus")]
        mucus: Option<String>,

        #[arg(long)]
        clear_mucus: bool,

        #[arg(long, conflicts_with = "clear_symptoms")]
        symptoms: Option<String>,

        #[arg(long)]
        clear_symptoms: bool,
    },

    /// Delete an ovulation record
    Delete { id: Uuid },
}

#[derive(Subcommand)]
enum PredictTarget {
    /// Predict the next period start
    Period,

    /// Predict the next ovulation
    Ovulation {
        /// Reference date for rolling past estimates forward (default: today)
        #[arg(long)]
        today: Option<String>,
    },
}

/// Resolved settings shared by every command
struct Context {
    records_path: PathBuf,
    data_dir: PathBuf,
    user: String,
    json: bool,
    params: PredictionParams,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        cyclecast_core::logging::init_with_level("debug");
    } else {
        cyclecast_core::logging::init_with_level("warn");
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let ctx = Context {
        records_path: data_dir.join(RECORDS_FILE),
        data_dir,
        user: cli.user.unwrap_or_else(|| config.data.user.clone()),
        json: cli.json,
        params: config.prediction,
    };
    tracing::debug!("Using records at {:?} for user {}", ctx.records_path, ctx.user);

    match cli.command {
        Commands::Period { action } => cmd_period(&ctx, action),
        Commands::Ovulation { action } => cmd_ovulation(&ctx, action),
        Commands::Predict { target } => cmd_predict(&ctx, target),
        Commands::Stats => cmd_stats(&ctx),
        Commands::Export { out_dir } => cmd_export(&ctx, out_dir),
        Commands::Import {
            periods,
            ovulations,
        } => cmd_import(&ctx, periods, ovulations),
    }
}

fn cmd_period(ctx: &Context, action: PeriodAction) -> Result<()> {
    match action {
        PeriodAction::Add {
            start,
            end,
            flow,
            symptoms,
        } => {
            let mut period = PeriodRecord::new(ctx.user.clone(), parse_date(&start)?);
            period.end_date = parse_optional_date(end.as_deref())?;
            period.flow_intensity = flow;
            period.symptoms = symptoms;

            let stored = period.clone();
            RecordBook::update(&ctx.records_path, |book| book.add_period(period))?;

            if ctx.json {
                print_json(&stored)?;
            } else {
                println!("✓ Period recorded: {}", stored.id);
            }
        }

        PeriodAction::List => {
            let periods = RecordBook::load(&ctx.records_path)?.periods_for(&ctx.user);
            if ctx.json {
                print_json(&periods)?;
            } else if periods.is_empty() {
                println!("No periods recorded.");
            } else {
                for period in &periods {
                    display_period(period);
                }
            }
        }

        PeriodAction::Show { id } => {
            let book = RecordBook::load(&ctx.records_path)?;
            let period = book.period(&ctx.user, id)?;
            if ctx.json {
                print_json(period)?;
            } else {
                display_period(period);
            }
        }

        PeriodAction::Update {
            id,
            start,
            end,
            clear_end,
            flow,
            clear_flow,
            symptoms,
            clear_symptoms,
        } => {
            let update = PeriodUpdate {
                start_date: parse_optional_date(start.as_deref())?,
                end_date: patch(parse_optional_date(end.as_deref())?, clear_end),
                flow_intensity: patch(flow, clear_flow),
                symptoms: patch(symptoms, clear_symptoms),
            };

            let updated = RecordBook::update(&ctx.records_path, |book| {
                book.update_period(&ctx.user, id, update)
            })?;

            if ctx.json {
                print_json(&updated)?;
            } else {
                println!("✓ Period updated");
                display_period(&updated);
            }
        }

        PeriodAction::Delete { id } => {
            let removed = RecordBook::update(&ctx.records_path, |book| {
                book.remove_period(&ctx.user, id)
            })?;
            if ctx.json {
                print_json(&removed)?;
            } else {
                println!("✓ Period deleted: {}", removed.id);
            }
        }
    }

    Ok(())
}

fn cmd_ovulation(ctx: &Context, action: OvulationAction) -> Result<()> {
    match action {
        OvulationAction::Add {
            date,
            temperature,
            mucus,
            symptoms,
        } => {
            let mut ovulation = OvulationRecord::new(ctx.user.clone(), parse_date(&date)?);
            ovulation.basal_body_temperature = temperature;
            ovulation.cervical_mucus = mucus;
            ovulation.symptoms = symptoms;

            let stored = ovulation.clone();
            RecordBook::update(&ctx.records_path, |book| book.add_ovulation(ovulation))?;

            if ctx.json {
                print_json(&stored)?;
            } else {
                println!("✓ Ovulation recorded: {}", stored.id);
            }
        }

        OvulationAction::List => {
            let ovulations = RecordBook::load(&ctx.records_path)?.ovulations_for(&ctx.user);
            if ctx.json {
                print_json(&ovulations)?;
            } else if ovulations.is_empty() {
                println!("No ovulation records.");
            } else {
                for ovulation in &ovulations {
                    display_ovulation(ovulation);
                }
            }
        }

        OvulationAction::Show { id } => {
            let book = RecordBook::load(&ctx.records_path)?;
            let ovulation = book.ovulation(&ctx.user, id)?;
            if ctx.json {
                print_json(ovulation)?;
            } else {
                display_ovulation(ovulation);
            }
        }

        OvulationAction::Update {
            id,
            date,
            temperature,
            clear_temperature,
            mucus,
            clear_mucus,
            symptoms,
            clear_symptoms,
        } => {
            let update = OvulationUpdate {
                ovulation_date: parse_optional_date(date.as_deref())?,
                basal_body_temperature: patch(temperature, clear_temperature),
                cervical_mucus: patch(mucus, clear_mucus),
                symptoms: patch(symptoms, clear_symptoms),
            };

            let updated = RecordBook::update(&ctx.records_path, |book| {
                book.update_ovulation(&ctx.user, id, update)
            })?;

            if ctx.json {
                print_json(&updated)?;
            } else {
                println!("✓ Ovulation record updated");
                display_ovulation(&updated);
            }
        }

        OvulationAction::Delete { id } => {
            let removed = RecordBook::update(&ctx.records_path, |book| {
                book.remove_ovulation(&ctx.user, id)
            })?;
            if ctx.json {
                print_json(&removed)?;
            } else {
                println!("✓ Ovulation record deleted: {}", removed.id);
            }
        }
    }

    Ok(())
}

fn cmd_predict(ctx: &Context, target: PredictTarget) -> Result<()> {
    let book = RecordBook::load(&ctx.records_path)?;
    let limit = ctx.params.history_limit;

    match target {
        PredictTarget::Period => {
            let periods = book.recent_periods(&ctx.user, limit);
            let forecast = predict_next_period(&periods, &ctx.params)?;

            if ctx.json {
                return print_json(&forecast);
            }

            match (forecast.predicted_date, forecast.average_cycle_length) {
                (Some(date), Some(avg)) => {
                    println!("Next period: {}", date);
                    println!("  Confidence: {}", forecast.confidence);
                    println!(
                        "  Average cycle: {:.1} days ({} cycles analyzed)",
                        avg, forecast.cycles_analyzed
                    );
                }
                _ => display_status(forecast.status.as_deref(), forecast.confidence),
            }
        }

        PredictTarget::Ovulation { today } => {
            let today = match today {
                Some(raw) => parse_date(&raw)?,
                None => chrono::Local::now().date_naive(),
            };
            let periods = book.recent_periods(&ctx.user, limit);
            let ovulations = book.recent_ovulations(&ctx.user, limit);
            let forecast = predict_next_ovulation(&periods, &ovulations, today, &ctx.params)?;

            if ctx.json {
                return print_json(&forecast);
            }

            match (forecast.predicted_date, forecast.average_ovulation_day) {
                (Some(date), Some(day)) => {
                    println!("Next ovulation: {}", date);
                    println!("  Confidence: {}", forecast.confidence);
                    println!(
                        "  Average ovulation day: {:.1} ({} records analyzed)",
                        day, forecast.ovulation_records_analyzed
                    );
                    if let Some(window) = fertile_window(&forecast, &ctx.params) {
                        println!(
                            "  Fertile window: {} to {}",
                            window.fertile_start, window.fertile_end
                        );
                    }
                }
                _ => display_status(forecast.status.as_deref(), forecast.confidence),
            }
        }
    }

    Ok(())
}

fn cmd_stats(ctx: &Context) -> Result<()> {
    let book = RecordBook::load(&ctx.records_path)?;
    let periods = book.periods_for(&ctx.user);
    let ovulations = book.ovulations_for(&ctx.user);
    let stats = cycle_stats(&periods, &ovulations, &ctx.params)?;

    if ctx.json {
        return print_json(&stats);
    }

    println!("Periods recorded:    {}", stats.total_periods);
    println!("Ovulations recorded: {}", stats.total_ovulations);
    println!(
        "Average cycle:       {}",
        days_or_dash(stats.average_cycle_length)
    );
    println!(
        "Regularity:          {}",
        stats
            .cycle_regularity
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".into())
    );
    println!(
        "Average period:      {}",
        days_or_dash(stats.average_period_length)
    );
    if let (Some(shortest), Some(longest)) = (stats.shortest_cycle, stats.longest_cycle) {
        println!("Cycle range:         {}-{} days", shortest, longest);
    }

    Ok(())
}

fn cmd_export(ctx: &Context, out_dir: Option<PathBuf>) -> Result<()> {
    let out_dir = out_dir.unwrap_or_else(|| ctx.data_dir.join("export"));
    let book = RecordBook::load(&ctx.records_path)?;

    let periods_path = out_dir.join("periods.csv");
    let ovulations_path = out_dir.join("ovulations.csv");
    let periods = export::export_periods(&book, &ctx.user, &periods_path)?;
    let ovulations = export::export_ovulations(&book, &ctx.user, &ovulations_path)?;

    println!("✓ Exported {} periods to {}", periods, periods_path.display());
    println!(
        "✓ Exported {} ovulation records to {}",
        ovulations,
        ovulations_path.display()
    );
    Ok(())
}

fn cmd_import(
    ctx: &Context,
    periods: Option<PathBuf>,
    ovulations: Option<PathBuf>,
) -> Result<()> {
    if periods.is_none() && ovulations.is_none() {
        println!("Nothing to import - pass --periods and/or --ovulations.");
        return Ok(());
    }

    let new_periods = match &periods {
        Some(path) => export::import_periods(path, &ctx.user)?,
        None => Vec::new(),
    };
    let new_ovulations = match &ovulations {
        Some(path) => export::import_ovulations(path, &ctx.user)?,
        None => Vec::new(),
    };
    let read = new_periods.len() + new_ovulations.len();

    let (period_count, ovulation_count) = RecordBook::update(&ctx.records_path, |book| {
        Ok((
            book.merge_periods(new_periods)?,
            book.merge_ovulations(new_ovulations)?,
        ))
    })?;

    println!(
        "✓ Imported {} periods and {} ovulation records",
        period_count, ovulation_count
    );
    let skipped = read - period_count - ovulation_count;
    if skipped > 0 {
        println!("  Skipped {} already recorded", skipped);
    }
    Ok(())
}

fn parse_optional_date(raw: Option<&str>) -> Result<Option<NaiveDate>> {
    raw.map(parse_date).transpose()
}

/// Field patch from a `--<field>` value and its `--clear-<field>` flag
fn patch<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    if clear {
        Some(None)
    } else {
        value.map(Some)
    }
}

fn parse_mucus(raw: &str) -> std::result::Result<String, String> {
    let value = raw.trim().to_lowercase();
    if CERVICAL_MUCUS_VALUES.contains(&value.as_str()) {
        Ok(value)
    } else {
        Err(format!(
            "expected one of: {}",
            CERVICAL_MUCUS_VALUES.join(", ")
        ))
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn display_period(period: &PeriodRecord) {
    let end = period
        .end_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "ongoing".into());
    print!("{}  {} → {}", period.id, period.start_date, end);
    if let Some(days) = period.length_days() {
        print!("  ({} days)", days);
    }
    if let Some(ref flow) = period.flow_intensity {
        print!("  flow: {}", flow);
    }
    if let Some(ref symptoms) = period.symptoms {
        print!("  symptoms: {}", symptoms);
    }
    println!();
}

fn display_ovulation(ovulation: &OvulationRecord) {
    print!("{}  {}", ovulation.id, ovulation.ovulation_date);
    if let Some(temperature) = ovulation.basal_body_temperature {
        print!("  BBT: {:.2}", temperature);
    }
    if let Some(ref mucus) = ovulation.cervical_mucus {
        print!("  mucus: {}", mucus);
    }
    if let Some(ref symptoms) = ovulation.symptoms {
        print!("  symptoms: {}", symptoms);
    }
    println!();
}

fn display_status(status: Option<&str>, confidence: Confidence) {
    println!("{}", status.unwrap_or("No prediction available."));
    println!("  Confidence: {}", confidence);
}

fn days_or_dash(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1} days", v))
        .unwrap_or_else(|| "-".into())
}
