use clap::{Parser, Subcommand};

/// Command-line interface definition for weeklygrind
#[derive(Parser)]
#[command(
    name = "weeklygrind",
    version = env!("CARGO_PKG_VERSION"),
    about = "Weekly Grind operations server: weekly schedule grid, projects, equipment and drive destruction over SQLite",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Manage the configuration file (view or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,

        #[arg(long = "check", help = "Check configuration file for missing fields")]
        check: bool,

        #[arg(long = "migrate", help = "Add missing fields with their default values")]
        migrate: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/vim/notepad)"
        )]
        edit_config: bool,

        #[arg(
            long = "editor",
            requires = "edit_config",
            help = "Specify the editor to use (vim, nano, or custom path)"
        )]
        editor: Option<String>,
    },

    /// Manage the database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// Print the internal audit log
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },

    /// Run the HTTP server
    Serve {
        #[arg(long, value_name = "ADDR", help = "Bind address (overrides bind_address)")]
        bind: Option<String>,

        #[arg(long, short, help = "Port (overrides port)")]
        port: Option<u16>,
    },

    /// Weekly schedule blobs
    Schedule {
        #[command(subcommand)]
        action: ScheduleCmd,
    },

    /// Accounts and roles
    User {
        #[command(subcommand)]
        action: UserCmd,
    },
}

#[derive(Subcommand)]
pub enum ScheduleCmd {
    /// Print a stored week as a table
    Show {
        /// Any day of the week (YYYY-MM-DD) or "current"
        #[arg(long, short, default_value = "current")]
        week: String,
    },

    /// Store a CSV file as the week's schedule
    Import {
        #[arg(long, short)]
        week: String,

        #[arg(long, value_name = "FILE")]
        file: String,
    },

    /// Write a stored week to a CSV file
    Export {
        #[arg(long, short)]
        week: String,

        #[arg(long, value_name = "FILE")]
        file: String,

        #[arg(long, short = 'f', help = "Overwrite an existing file")]
        force: bool,
    },

    /// Merge the completion toggles of a grid file into a CSV file
    Apply {
        #[arg(long, value_name = "FILE")]
        file: String,

        #[arg(long, value_name = "GRID_JSON")]
        grid: String,

        #[arg(long, value_name = "FILE", help = "Write here instead of stdout")]
        out: Option<String>,
    },

    /// Lay out a new week CSV from a grid file
    Build {
        #[arg(long, short)]
        week: String,

        #[arg(long, value_name = "GRID_JSON")]
        grid: String,

        #[arg(long, value_name = "FILE")]
        out: String,

        #[arg(long, short = 'f', help = "Overwrite an existing file")]
        force: bool,
    },

    /// Save a week to a running server
    Push {
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        server: String,

        #[arg(long, short)]
        week: String,

        #[arg(long, value_name = "FILE")]
        file: String,

        #[arg(long, value_name = "GRID_JSON", help = "Grid state whose toggles are merged before sending")]
        grid: Option<String>,

        #[arg(long = "json-wrap", help = "Send the CSV as a JSON string")]
        json_wrap: bool,
    },

    /// List stored weeks
    Weeks,
}

#[derive(Subcommand)]
pub enum UserCmd {
    /// Create an account
    Add {
        username: String,

        #[arg(long, help = "Display name (defaults to the username)")]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long, default_value = "tech", help = "admin, coordinator, supervisor, manager or tech")]
        role: String,

        #[arg(long)]
        password: String,
    },

    /// List accounts
    List {
        #[arg(long)]
        role: Option<String>,
    },

    /// Set a new password
    Passwd {
        username: String,

        #[arg(long)]
        password: String,
    },
}
