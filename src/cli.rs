// File: ./src/cli.rs
//! Command-line front end: argument parsing, help text and command dispatch.
use crate::auth;
use crate::catalog;
use crate::config::Config;
use crate::context::{AppContext, StandardContext};
use crate::controller::BookingController;
use crate::reminder::SystemClock;
use crate::seats;
use crate::system::{ActorOptions, spawn_reminder_actor};
use anyhow::{Result, anyhow, bail};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Movies { query: String },
    Seats { movie_id: u32, showtime: String },
    Book {
        movie_id: u32,
        showtime: String,
        row: u32,
        seat: u32,
    },
    Tickets { query: String },
    Qr { ticket_id: u64 },
    Delete { ticket_id: u64 },
    Login { user: String, password: String },
    Register {
        email: String,
        password: String,
        confirm: String,
    },
    TestNotification,
    /// Show settings, or turn exact reminders on/off
    Config { exact_alarms: Option<bool> },
    /// Stay in the foreground and deliver saved reminders until Ctrl-C
    Watch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub root: Option<PathBuf>,
    pub verbose: bool,
    /// Seconds to keep running so pending reminders can fire
    pub wait_secs: u64,
    pub command: Command,
}

fn parse_num<T: std::str::FromStr>(value: Option<&String>, what: &str) -> Result<T> {
    let value = value.ok_or_else(|| anyhow!("Missing {}", what))?;
    value
        .parse()
        .map_err(|_| anyhow!("Invalid {}: '{}'", what, value))
}

fn required(value: Option<&String>, what: &str) -> Result<String> {
    value.cloned().ok_or_else(|| anyhow!("Missing {}", what))
}

/// Parses arguments, excluding the binary name.
pub fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut root = None;
    let mut verbose = false;
    let mut wait_secs = 0;
    let mut rest: Vec<String> = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-r" | "--root" => {
                let path = iter.next().ok_or_else(|| anyhow!("--root needs a path"))?;
                root = Some(PathBuf::from(path));
            }
            "-v" | "--verbose" => verbose = true,
            "-w" | "--wait" => wait_secs = parse_num(iter.next(), "--wait seconds")?,
            "-h" | "--help" | "help" => {
                return Ok(CliArgs {
                    root,
                    verbose,
                    wait_secs,
                    command: Command::Help,
                });
            }
            _ => rest.push(arg.clone()),
        }
    }

    let command = match rest.first().map(String::as_str) {
        None => Command::Help,
        Some("movies") => Command::Movies {
            query: rest[1..].join(" "),
        },
        Some("seats") => Command::Seats {
            movie_id: parse_num(rest.get(1), "movie id")?,
            showtime: required(rest.get(2), "showtime")?,
        },
        Some("book") => Command::Book {
            movie_id: parse_num(rest.get(1), "movie id")?,
            showtime: required(rest.get(2), "showtime")?,
            row: parse_num(rest.get(3), "row")?,
            seat: parse_num(rest.get(4), "seat number")?,
        },
        Some("tickets") => Command::Tickets {
            query: rest[1..].join(" "),
        },
        Some("qr") => Command::Qr {
            ticket_id: parse_num(rest.get(1), "ticket id")?,
        },
        Some("delete") => Command::Delete {
            ticket_id: parse_num(rest.get(1), "ticket id")?,
        },
        Some("login") => Command::Login {
            user: required(rest.get(1), "user")?,
            password: required(rest.get(2), "password")?,
        },
        Some("register") => Command::Register {
            email: required(rest.get(1), "email")?,
            password: required(rest.get(2), "password")?,
            confirm: required(rest.get(3), "password confirmation")?,
        },
        Some("test-notification") => Command::TestNotification,
        Some("watch") => Command::Watch,
        Some("config") => Command::Config {
            exact_alarms: match (rest.get(1).map(String::as_str), rest.get(2).map(String::as_str)) {
                (None, _) => None,
                (Some("exact-alarms"), Some("on")) => Some(true),
                (Some("exact-alarms"), Some("off")) => Some(false),
                _ => bail!("Usage: config [exact-alarms on|off]"),
            },
        },
        Some(other) => bail!("Unknown command '{}'. Try --help.", other),
    };

    Ok(CliArgs {
        root,
        verbose,
        wait_secs,
        command,
    })
}

pub fn print_help(binary_name: &str) {
    println!(
        "Kinopass v{} - cinema tickets and showtime reminders",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("USAGE:");
    println!("    {} [OPTIONS] <COMMAND>", binary_name);
    println!();
    println!("OPTIONS:");
    println!("    -r, --root <path>     Use a different directory for config and data.");
    println!("    -w, --wait <secs>     Keep running so reminders due within <secs> can fire.");
    println!("    -v, --verbose         Debug logging.");
    println!("    -h, --help            Show this help message.");
    println!();
    println!("COMMANDS:");
    println!("    movies [query]                          List films now showing");
    println!("    seats <movie-id> <HH:MM>                Show the seat map for a showing");
    println!("    book <movie-id> <HH:MM> <row> <seat>    Book a seat for today's showing");
    println!("    tickets [query]                         List your tickets");
    println!("    qr <ticket-id>                          Print the ticket's QR payload");
    println!("    delete <ticket-id>                      Delete a ticket");
    println!("    login <email|user> <password>           Check demo login");
    println!("    register <email> <password> <confirm>   Register a local demo user");
    println!("    test-notification                       Send a test reminder in 5 seconds");
    println!("    config [exact-alarms on|off]            Show or change settings");
    println!("    watch                                   Deliver saved reminders until Ctrl-C");
    println!();
    println!("Reminders fire {} minutes before the showing.", crate::reminder::REMINDER_LEAD_MINUTES);
    println!("They are saved and delivered by whichever kinopass process runs next;");
    println!("keep `kinopass watch` running to get them on time.");
}

fn print_seat_map(layout: &[Vec<seats::Seat>]) {
    println!("          SCREEN");
    for row in layout {
        let cells: Vec<&str> = row
            .iter()
            .map(|s| if s.is_taken { "[x]" } else { "[ ]" })
            .collect();
        println!("Row {}  {}", row.first().map(|s| s.row).unwrap_or(0), cells.join(""));
    }
    println!("[ ] free  [x] taken");
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

/// Executes a parsed command. Must run inside a tokio runtime because
/// bookings hand reminders to the background actor.
pub async fn run(args: CliArgs) -> Result<()> {
    let ctx: Arc<dyn AppContext> = Arc::new(StandardContext::new(args.root.clone()));
    let config = Config::load_or_default(ctx.as_ref())?;
    let sink = spawn_reminder_actor(ActorOptions::from_config(&config, ctx.as_ref()), None);
    let controller = BookingController::new(ctx.clone(), Arc::new(sink.clone()), Arc::new(SystemClock));

    match args.command {
        Command::Help => print_help("kinopass"),
        Command::Movies { query } => {
            for m in catalog::search(&query) {
                println!("{:>2}  {:<16} {}", m.id, m.title, m.showtimes.join("  "));
            }
        }
        Command::Seats { movie_id, showtime } => {
            let movie =
                catalog::find(movie_id).ok_or_else(|| anyhow!("No movie with id {}", movie_id))?;
            println!("\"{}\" at {}", movie.title, showtime);
            let taken = controller.taken_seats(&movie.title, &showtime)?;
            print_seat_map(&seats::default_layout(&taken));
        }
        Command::Book {
            movie_id,
            showtime,
            row,
            seat,
        } => {
            let receipt = controller.book_showing(movie_id, &showtime, row, seat)?;
            let t = &receipt.ticket;
            println!("Booked: {} – {} – {} (ticket {})", t.movie_title, t.time, t.seat, t.id);
            println!("{}", receipt.outcome);
        }
        Command::Tickets { query } => {
            let tickets = controller.search_tickets(&query)?;
            if tickets.is_empty() {
                println!("No tickets.");
            }
            for t in tickets {
                println!("{:>3}  {:<16} {}  {}", t.id, t.movie_title, t.time, t.seat);
            }
        }
        Command::Qr { ticket_id } => {
            let t = controller
                .ticket(ticket_id)?
                .ok_or_else(|| anyhow!("No ticket with id {}", ticket_id))?;
            println!("{}", t.qr_payload());
        }
        Command::Delete { ticket_id } => {
            if controller.delete(ticket_id)? {
                println!("Deleted ticket {}.", ticket_id);
            } else {
                bail!("No ticket with id {}", ticket_id);
            }
        }
        Command::Login { user, password } => {
            if auth::check_login(ctx.as_ref(), &user, &password) {
                println!("Login successful.");
            } else {
                bail!("Wrong email or password.");
            }
        }
        Command::Register {
            email,
            password,
            confirm,
        } => {
            auth::register(ctx.as_ref(), &email, &password, &confirm)?;
            println!("User registered.");
        }
        Command::TestNotification => {
            controller.test_notification();
            println!("Test notification queued.");
        }
        Command::Watch => {
            if let Some(p) = sink.pending().await {
                println!(
                    "Watching {} reminder(s) and {} queued job(s). Ctrl-C to stop.",
                    p.exact, p.deferred
                );
            }
            tokio::signal::ctrl_c().await?;
        }
        Command::Config { exact_alarms } => {
            let mut config = config;
            if let Some(enabled) = exact_alarms {
                config.exact_alarms_permitted = enabled;
                config.save(ctx.as_ref())?;
            }
            println!("Config file:     {}", Config::get_path_string(ctx.as_ref())?);
            println!("Exact reminders: {}", on_off(config.exact_alarms_permitted));
            println!("Notifications:   {}", on_off(config.notifications_enabled));
        }
    }

    if args.wait_secs > 0 {
        wait_for_reminders(&sink, args.wait_secs).await;
    }
    // Reminders handed to the actor must reach reminders.json before exit
    sink.flush().await;
    Ok(())
}

/// Keeps the process alive until nothing is due within `secs`, or the time is up.
async fn wait_for_reminders(sink: &crate::system::DesktopReminderSink, secs: u64) {
    let deadline = chrono::Utc::now() + chrono::Duration::seconds(secs as i64);
    while let Some(pending) = sink.pending().await {
        match pending.next_due {
            Some(due) if due <= deadline => {
                tokio::time::sleep(std::time::Duration::from_millis(250)).await;
            }
            _ => break,
        }
    }
}
