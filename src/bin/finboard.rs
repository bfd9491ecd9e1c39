use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};

use finboard::{
    Alert, ClientConfig, DEFAULT_API_URL, DEFAULT_CREDENTIALS_PATH, Dashboard, Error,
    ErrorHandler, FinanceService, Navigator, QueryState, Route, SavedBudget, Section,
    local_today,
    models::{BudgetCategory, Category, SpendingInsight, TransactionFilter, TransactionKind, iso_date},
    setup_logging, validate_budget_limit, validate_registration, validate_transaction_form,
    view_model::{
        BudgetOverview, BudgetRow, TransactionRow, TransactionSearch, budget_overview,
        filter_transactions, format_currency, format_currency_rounded, monthly_history,
    },
};

/// A command line client for the Finance Service.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The base URL of the Finance Service API.
    #[arg(long, env = "FINBOARD_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// A canonical timezone name, e.g. "Pacific/Auckland", used to work out today's date.
    #[arg(long, env = "FINBOARD_TIMEZONE", default_value = "UTC")]
    timezone: String,

    /// Where to store the session token between runs.
    #[arg(long, env = "FINBOARD_CREDENTIALS", default_value = DEFAULT_CREDENTIALS_PATH)]
    credentials: PathBuf,

    /// Append debug logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log requests and responses to stderr.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in. The password is read from the terminal.
    Login {
        #[arg(long)]
        email: String,
    },
    /// Create an account. The password is read from the terminal.
    Register {
        /// Your full name.
        #[arg(long)]
        name: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
    },
    /// Log out and delete the stored session.
    Logout,
    /// Show this month's stats, spending, budgets and the latest insight.
    Dashboard,
    /// List, add or delete transactions.
    Transactions {
        #[command(subcommand)]
        command: TransactionCommand,
    },
    /// List, set or delete budgets.
    Budgets {
        #[command(subcommand)]
        command: BudgetCommand,
    },
    /// Import transactions from a CSV file.
    Upload { file: PathBuf },
    /// Show or generate AI spending insights.
    Insights {
        /// Ask the Finance Service to generate a new insight.
        #[arg(long)]
        generate: bool,
        /// The month to analyse, as YYYY-MM.
        #[arg(long)]
        month: Option<String>,
    },
    /// Show a month by month summary of spending.
    History,
}

#[derive(Subcommand, Debug)]
enum TransactionCommand {
    List {
        /// Only show transactions whose description contains this text.
        #[arg(long, default_value = "")]
        search: String,
        /// Only show this category, or "all".
        #[arg(long, default_value = "all")]
        category: String,
        /// Only show transactions on or after this date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,
        /// Only show transactions on or before this date (YYYY-MM-DD).
        #[arg(long)]
        end: Option<String>,
    },
    Add {
        /// The date as YYYY-MM-DD.
        date: String,
        description: String,
        /// The amount without a sign.
        amount: String,
        category: String,
        /// Record money in rather than money out.
        #[arg(long)]
        income: bool,
    },
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
enum BudgetCommand {
    List,
    /// Set the monthly limit for a category, or "total" for all spending.
    Set { category: String, amount: String },
    Delete { id: String },
}

impl Command {
    fn route(&self) -> Route {
        match self {
            Command::Login { .. } | Command::Register { .. } | Command::Logout => Route::Auth,
            Command::Dashboard => Route::Dashboard,
            Command::Transactions { .. } => Route::Transactions,
            Command::Budgets { .. } => Route::Budgets,
            Command::Upload { .. } => Route::Upload,
            Command::Insights { .. } => Route::Insights,
            Command::History => Route::History,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(error) = setup_logging(args.log_file.as_deref(), args.verbose) {
        eprintln!("{}", error.into_alert());
        return ExitCode::FAILURE;
    }

    let service = match ClientConfig::new(&args.api_url, &args.timezone)
        .map(|config| config.with_credentials_path(&args.credentials))
        .and_then(FinanceService::from_config)
    {
        Ok(service) => service,
        Err(error) => {
            eprintln!("{}", error.into_alert());
            return ExitCode::FAILURE;
        }
    };

    let route = args.command.route();
    if route.requires_session() && !service.session().is_authenticated() {
        eprintln!(
            "{}",
            Alert::error("Not logged in", "Run `finboard login` to log in first.")
        );
        return ExitCode::FAILURE;
    }

    let navigator = Navigator::for_session(service.session());
    navigator.navigate(route);
    let handler = ErrorHandler::new(
        service.session().clone(),
        service.cache().clone(),
        navigator,
    );

    match run(&service, &args.timezone, args.command).await {
        Ok(Some(alert)) => {
            println!("{alert}");
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{}", handler.handle(error));

            if handler.navigator().current() == Route::Auth && route != Route::Auth {
                eprintln!("Run `finboard login` to log in again.");
            }

            ExitCode::FAILURE
        }
    }
}

/// Run `command`, printing any output, and return the alert to show on success.
async fn run(
    service: &FinanceService,
    timezone: &str,
    command: Command,
) -> Result<Option<Alert>, Error> {
    match command {
        Command::Login { email } => {
            let password = rpassword::prompt_password("Password: ")?;
            let user = service.log_in(&email, &password).await?;

            Ok(Some(Alert::success(
                "Welcome back!",
                &format!("You have successfully logged in as {}.", user.email),
            )))
        }
        Command::Register {
            name,
            username,
            email,
        } => {
            let password = rpassword::prompt_password("Password: ")?;
            let request = validate_registration(&name, &username, &email, &password)?;
            service.register(&request).await?;

            Ok(Some(Alert::success(
                "Account created!",
                "Your account has been created successfully.",
            )))
        }
        Command::Logout => {
            service.log_out()?;
            Ok(Some(Alert::success("Logged out", "")))
        }
        Command::Dashboard => {
            let today = local_today(timezone)?;
            let dashboard = service.load_dashboard(today).await?;
            print_dashboard(&dashboard);
            Ok(None)
        }
        Command::Transactions { command } => run_transactions(service, command).await,
        Command::Budgets { command } => run_budgets(service, timezone, command).await,
        Command::Upload { file } => {
            let count = service.upload_csv(&file).await?;

            Ok(Some(Alert::success(
                "File processed successfully",
                &format!("{count} transactions have been imported."),
            )))
        }
        Command::Insights { generate, month } => {
            let insight = if generate {
                service.generate_analysis(month.as_deref()).await?
            } else {
                match &month {
                    Some(month) => settled(service.monthly_analysis(month).await)?,
                    None => settled(service.analysis(None).await)?,
                }
            };

            print_insight(&insight);
            Ok(None)
        }
        Command::History => {
            let transactions = settled(service.transactions(&TransactionFilter::default()).await)?;

            for summary in monthly_history(&transactions) {
                let change = summary
                    .change_percentage
                    .map(|change| format!("{change:+.1}% vs previous month"))
                    .unwrap_or_default();
                let top = summary
                    .top_category
                    .map(Category::label)
                    .unwrap_or("None");

                println!("{}", summary.label);
                println!(
                    "  Spent {}  Income {}  Saved {}  {change}",
                    format_currency_rounded(summary.total_spent),
                    format_currency_rounded(summary.total_income),
                    format_currency_rounded(summary.savings()),
                );
                println!("  Top category: {top}");
            }

            Ok(None)
        }
    }
}

async fn run_transactions(
    service: &FinanceService,
    command: TransactionCommand,
) -> Result<Option<Alert>, Error> {
    match command {
        TransactionCommand::List {
            search,
            category,
            start,
            end,
        } => {
            let search = TransactionSearch::from_inputs(&search, &category)?;
            let filter = TransactionFilter {
                start_date: start.as_deref().map(parse_date).transpose()?,
                end_date: end.as_deref().map(parse_date).transpose()?,
                category: search.category,
            };

            let transactions = settled(service.transactions(&filter).await)?;
            let found = filter_transactions(&transactions, &search);

            for transaction in &found {
                let row = TransactionRow::from(transaction);
                println!(
                    "{:<13} {} {:<30} {:<20} {:>12}  {}",
                    row.date,
                    row.category_icon,
                    row.description,
                    row.category_label,
                    row.amount,
                    row.id
                );
            }

            let plural = if found.len() == 1 { "" } else { "s" };
            println!("{} transaction{plural}", found.len());
            Ok(None)
        }
        TransactionCommand::Add {
            date,
            description,
            amount,
            category,
            income,
        } => {
            let kind = if income {
                TransactionKind::Income
            } else {
                TransactionKind::Expense
            };
            let transaction = validate_transaction_form(&date, &description, &amount, &category, kind)?;
            service.create_transaction(&transaction).await?;

            Ok(Some(Alert::success(
                "Transaction added",
                "Your transaction has been recorded.",
            )))
        }
        TransactionCommand::Delete { id } => {
            service.delete_transaction(&id).await?;
            Ok(Some(Alert::success("Transaction deleted", "")))
        }
    }
}

async fn run_budgets(
    service: &FinanceService,
    timezone: &str,
    command: BudgetCommand,
) -> Result<Option<Alert>, Error> {
    match command {
        BudgetCommand::List => {
            let budgets = settled(service.budgets().await)?;
            print_budgets(&budget_overview(&budgets));
            Ok(None)
        }
        BudgetCommand::Set { category, amount } => {
            let category: BudgetCategory = category.parse()?;
            let limit = validate_budget_limit(&amount)?;
            let today = local_today(timezone)?;

            let alert = match service.set_budget(category, limit, today).await? {
                SavedBudget::Created(_) => {
                    Alert::success("Budget created", "Your new budget has been created.")
                }
                SavedBudget::Updated(_) => Alert::success(
                    "Budget updated",
                    "Your budget has been updated successfully.",
                ),
            };

            Ok(Some(alert))
        }
        BudgetCommand::Delete { id } => {
            service.delete_budget(&id).await?;
            Ok(Some(Alert::success("Budget deleted", "")))
        }
    }
}

/// The data of a finished query. A query that did not run means nobody is logged in.
fn settled<T>(state: QueryState<T>) -> Result<T, Error> {
    state.into_result().unwrap_or(Err(Error::Unauthorized))
}

fn parse_date(text: &str) -> Result<time::Date, Error> {
    iso_date::parse_date(text).map_err(|_| Error::InvalidDate(text.to_owned()))
}

fn print_dashboard(dashboard: &Dashboard) {
    println!("== This month ==");
    print_section(&dashboard.stats, |stats| {
        println!("  Balance       {}", format_currency(stats.balance));
        println!("  Income        {}", format_currency(stats.total_income));
        println!("  Spent         {}", format_currency(stats.total_spent));
        println!("  Transactions  {}", stats.transaction_count);
    });

    println!("\n== Spending over the last 30 days ==");
    print_section(&dashboard.spending_chart, |days| {
        let peak = days.iter().map(|day| day.amount).fold(0.0, f64::max);

        for day in days.iter().filter(|day| day.amount > 0.0) {
            println!(
                "  {:<7} {:<20} {}",
                day.label,
                bar(day.amount, peak, 20),
                format_currency(day.amount)
            );
        }
    });

    println!("\n== Spending by category ==");
    print_section(&dashboard.category_chart, |totals| {
        for total in totals {
            println!(
                "  {} {:<20} {}",
                total.category.icon(),
                total.label(),
                format_currency(total.amount)
            );
        }
    });

    println!("\n== Budgets ==");
    print_section(&dashboard.budgets, print_budgets);

    println!("\n== AI insight ==");
    print_section(&dashboard.insight, |insight| println!("  {}", insight.summary));

    println!("\n== Recent transactions ==");
    print_section(&dashboard.recent_transactions, |rows| {
        for row in rows {
            println!(
                "  {:<13} {:<30} {:>12}",
                row.date, row.description, row.amount
            );
        }
    });
}

fn print_section<T>(section: &Section<T>, print: impl FnOnce(&T)) {
    match section {
        Section::Ready(view) => print(view),
        Section::Placeholder(message) => println!("  {message}"),
    }
}

fn print_budgets(overview: &BudgetOverview) {
    if overview.total.is_none() && overview.categories.is_empty() {
        println!("  No budgets set yet.");
        return;
    }

    for row in overview.total.iter().chain(&overview.categories) {
        print_budget_row(row);
    }
}

fn print_budget_row(row: &BudgetRow) {
    let remaining = if row.remaining >= 0.0 {
        format!("{} left", format_currency_rounded(row.remaining))
    } else {
        format!("{} over", format_currency_rounded(row.remaining.abs()))
    };

    println!(
        "  {} {:<20} [{:<10}] {:>5.0}%  {} of {}  {:<12} {}  ({})",
        row.icon,
        row.label,
        bar(row.usage.display_percentage, 100.0, 10),
        row.usage.display_percentage,
        format_currency_rounded(row.spent),
        format_currency_rounded(row.limit),
        remaining,
        row.usage.status.label(),
        row.id
    );
}

fn print_insight(insight: &SpendingInsight) {
    if insight.summary.trim().is_empty() {
        println!("No insights yet. Run `finboard insights --generate` to create one.");
        return;
    }

    println!("{}", insight.summary);

    if !insight.top_categories.is_empty() {
        println!("\nTop categories:");
        for top in &insight.top_categories {
            println!(
                "  {:<20} {} ({:.0}%)",
                top.category.label(),
                format_currency(top.amount),
                top.percentage
            );
        }
    }

    if !insight.saving_tips.is_empty() {
        println!("\nSaving tips:");
        for tip in &insight.saving_tips {
            println!("  - {tip}");
        }
    }

    if insight.suggested_saving_goal > 0.0 {
        println!(
            "\nSuggested saving goal: {}",
            format_currency(insight.suggested_saving_goal)
        );
    }

    for alert in &insight.alerts {
        println!("! {alert}");
    }
}

/// A text bar of `width` characters filled in proportion to `value / max`.
fn bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 {
        return String::new();
    }

    let filled = ((value / max).clamp(0.0, 1.0) * width as f64).round() as usize;
    "#".repeat(filled)
}
