use crate::domain::models::Query;
use crate::domain::schema::SectionKind;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "isearch",
    version,
    about = "A tool for intelligent searching of Android init.rc files"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(short, long, global = true, help = "Enable debug logging on stderr")]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct InputArgs {
    #[arg(required = true, help = "The init.rc file(s) to search")]
    pub files: Vec<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dumps the contents of the init.rc files to stdout
    Print {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, help = "Dump line numbers with keywords")]
        lineno: bool,
    },
    /// Searches a section kind of the init.rc files for keyword patterns
    Search {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Verifies the init.rc files against rule suites and white-list exceptions
    Verify {
        #[command(flatten)]
        input: InputArgs,
        #[arg(
            long = "assert",
            required = true,
            help = "Rule suite to verify against (XML, or JSON by .json extension)"
        )]
        rules: Vec<PathBuf>,
        #[arg(long, help = "Generate a list of exceptions for failed tests")]
        gen: bool,
    },
}

const REGEX_HELP: &str = "Argument is a regex. Repeat the option to require every pattern.";
const SINGLE_HELP: &str = "Argument is a regex.";
const NUMBER_HELP: &str =
    "Argument is an int, comparison (<x, <=x, ==x, !=x, >=x, >x) or range a,b. Quote it for the shell.";

#[derive(Args, Debug)]
pub struct SearchArgs {
    #[arg(long, value_enum, help = "Section kind to search")]
    pub section: SectionKind,
    #[arg(long, help = "Require patterns to match whole values instead of substrings")]
    pub lazy: bool,
    #[arg(long, help = "Only print matching keywords for each section")]
    pub tidy: bool,
    #[arg(long, help = "Print line numbers on matches")]
    pub lineno: bool,
    #[arg(long, help = "Print the number of matches")]
    pub count: bool,

    #[arg(long, help = REGEX_HELP)]
    pub args: Vec<String>,
    #[arg(long, help = REGEX_HELP)]
    pub command: Vec<String>,
    #[arg(long, help = REGEX_HELP)]
    pub setenv: Vec<String>,
    #[arg(long, help = REGEX_HELP)]
    pub getenv: Vec<String>,
    #[arg(long, help = REGEX_HELP)]
    pub socket: Vec<String>,
    #[arg(long, help = REGEX_HELP)]
    pub onrestart: Vec<String>,
    #[arg(long, help = REGEX_HELP)]
    pub writepid: Vec<String>,
    #[arg(long, help = REGEX_HELP)]
    pub keycodes: Vec<String>,

    #[arg(long, help = SINGLE_HELP)]
    pub user: Option<String>,
    #[arg(long, help = SINGLE_HELP)]
    pub group: Option<String>,
    #[arg(long, help = SINGLE_HELP)]
    pub seclabel: Option<String>,
    #[arg(long, help = SINGLE_HELP)]
    pub ioprio: Option<String>,
    #[arg(long, help = SINGLE_HELP)]
    pub start: Option<String>,
    #[arg(long, help = SINGLE_HELP)]
    pub class: Option<String>,
    #[arg(long, allow_hyphen_values = true, help = NUMBER_HELP)]
    pub priority: Option<String>,

    #[arg(long, conflicts_with = "notconsole", help = "Section has console set")]
    pub console: bool,
    #[arg(long, help = "Section does not have console set")]
    pub notconsole: bool,
    #[arg(long, conflicts_with = "notcritical", help = "Section has critical set")]
    pub critical: bool,
    #[arg(long, help = "Section does not have critical set")]
    pub notcritical: bool,
    #[arg(long, conflicts_with = "notdisabled", help = "Section has disabled set")]
    pub disabled: bool,
    #[arg(long, help = "Section does not have disabled set")]
    pub notdisabled: bool,
    #[arg(long, conflicts_with = "notoneshot", help = "Section has oneshot set")]
    pub oneshot: bool,
    #[arg(long, help = "Section does not have oneshot set")]
    pub notoneshot: bool,
}

impl SearchArgs {
    /// Collects the keyword options that were given into a query.
    pub fn query(&self) -> Query {
        let mut q = Query::new();
        let lists = [
            ("args", &self.args),
            ("command", &self.command),
            ("setenv", &self.setenv),
            ("getenv", &self.getenv),
            ("socket", &self.socket),
            ("onrestart", &self.onrestart),
            ("writepid", &self.writepid),
            ("keycodes", &self.keycodes),
        ];
        for (k, v) in lists {
            if !v.is_empty() {
                q.insert(k.to_string(), v.clone());
            }
        }

        let singles = [
            ("user", &self.user),
            ("group", &self.group),
            ("seclabel", &self.seclabel),
            ("ioprio", &self.ioprio),
            ("start", &self.start),
            ("class", &self.class),
            ("priority", &self.priority),
        ];
        for (k, v) in singles {
            if let Some(v) = v {
                q.insert(k.to_string(), vec![v.clone()]);
            }
        }

        let flags = [
            ("console", self.console, self.notconsole),
            ("critical", self.critical, self.notcritical),
            ("disabled", self.disabled, self.notdisabled),
            ("oneshot", self.oneshot, self.notoneshot),
        ];
        for (k, on, off) in flags {
            if on || off {
                q.insert(k.to_string(), vec![on.to_string()]);
            }
        }
        q
    }
}
