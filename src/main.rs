use chrono::Utc;
use clap::{ArgAction, Parser};
use loancalc::currency::{
    convert, currency_name, format_currency, ConvertedSummary, RateProvider, RateTable,
};
use loancalc::input::parse_loan_input;
use loancalc::report::{
    format_share, page_count, paginate, DEFAULT_ROWS_PER_PAGE, ROWS_PER_PAGE_OPTIONS,
};
use loancalc::{compute, PeriodEntry};
use log::{error, info, LevelFilter};
use simple_logger::SimpleLogger;
use std::process;

/// Loan installment and amortization calculator
#[derive(Parser)]
#[command(name = "loancalc", version)]
struct Cli {
    /// Loan amount
    #[arg(long, default_value = "100000")]
    amount: String,

    /// Annual interest rate in percent
    #[arg(long, default_value = "8.5")]
    rate: String,

    /// Loan term in years
    #[arg(long, default_value = "5")]
    term: String,

    /// Currency the loan is denominated in
    #[arg(long, default_value = "USD")]
    base: String,

    /// Currency to display results in
    #[arg(long, default_value = "USD")]
    currency: String,

    /// Exchange multiplier against the base currency (repeatable)
    #[arg(long = "fx", value_name = "CODE=MULTIPLIER", value_parser = parse_fx)]
    fx: Vec<(String, f64)>,

    /// Schedule page to print, starting at 0
    #[arg(long, default_value_t = 0)]
    page: usize,

    /// Schedule rows per page (5, 10, 25 or 50)
    #[arg(long, default_value_t = DEFAULT_ROWS_PER_PAGE, value_parser = parse_rows)]
    rows: usize,

    /// Print the whole schedule instead of one page
    #[arg(long)]
    all: bool,

    /// Increase log verbosity
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn parse_fx(value: &str) -> Result<(String, f64), String> {
    let (code, multiplier) = value
        .split_once('=')
        .ok_or_else(|| format!("expected CODE=MULTIPLIER, got {}", value))?;
    let multiplier = multiplier
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid multiplier for {}: {}", code, e))?;
    Ok((code.trim().to_uppercase(), multiplier))
}

fn parse_rows(value: &str) -> Result<usize, String> {
    let rows = value.parse::<usize>().map_err(|e| e.to_string())?;
    if ROWS_PER_PAGE_OPTIONS.contains(&rows) {
        Ok(rows)
    } else {
        Err(format!("rows per page must be one of {:?}", ROWS_PER_PAGE_OPTIONS))
    }
}

fn log_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = SimpleLogger::new().with_level(log_level(cli.verbose)).init() {
        eprintln!("failed to initialise logger: {}", e);
    }

    if let Err(e) = run(&cli) {
        error!("{}", e);
        eprintln!("{}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let params = parse_loan_input(&cli.amount, &cli.rate, &cli.term)?;
    info!(
        "calculating {} at {}% over {} years",
        params.principal(),
        params.annual_rate(),
        params.term_years()
    );
    let summary = compute(&params)?;

    let mut rates = RateTable::new(&cli.base, Utc::now());
    for (code, multiplier) in &cli.fx {
        rates.insert(code, *multiplier)?;
    }
    let converted = convert(&summary, &rates, &cli.currency)?;

    print_summary(&converted, &rates);

    let schedule = if cli.all {
        &converted.schedule[..]
    } else {
        paginate(&converted.schedule, cli.page, cli.rows)
    };
    print_schedule(schedule, &converted.currency);

    if !cli.all {
        println!(
            "page {} of {}",
            cli.page.saturating_add(1),
            page_count(converted.schedule.len(), cli.rows)
        );
    }
    Ok(())
}

fn print_summary(summary: &ConvertedSummary, rates: &RateTable) {
    let code = summary.currency.as_str();
    println!("Loan summary in {} ({})", code, currency_name(code));
    if code != rates.base() {
        println!("  1 {} = {:.4} {}", rates.base(), summary.multiplier, code);
    }
    println!(
        "  Monthly payment: {}",
        format_currency(summary.periodic_payment, code)
    );
    println!(
        "  Total payment:   {}",
        format_currency(summary.total_payment, code)
    );
    println!(
        "  Total interest:  {}",
        format_currency(summary.total_interest, code)
    );
    println!("  Interest share:  {}", format_share(summary.interest_share));
    println!("  Principal share: {}", format_share(summary.principal_share));
    println!();
}

fn print_schedule(rows: &[PeriodEntry], code: &str) {
    println!(
        "{:>6} {:>16} {:>16} {:>16} {:>18}",
        "Month", "Payment", "Principal", "Interest", "Balance"
    );
    println!("{}", "-".repeat(76));
    for row in rows {
        println!(
            "{:>6} {:>16} {:>16} {:>16} {:>18}",
            row.period,
            format_currency(row.payment_amount, code),
            format_currency(row.principal_portion, code),
            format_currency(row.interest_portion, code),
            format_currency(row.remaining_balance, code)
        );
    }
}
