//! co16 - CLI Entry Point
//!
//! Commands:
//! - `co16 run [image]` - Run a program until it halts
//! - `co16 debug [image]` - Terminal UI debugger
//! - `co16 repl [image]` - Line-oriented debugger on stdin/stdout
//! - `co16 disasm [image]` - Disassemble an image
//!
//! Without an image, the built-in demo program is used.

use clap::{Args, Parser, Subcommand};
use co16::program::{demo_program, disassemble, disassemble_word, load_image, ProgramImage};
use co16::shell::{Session, ShellConfig};

#[derive(Parser)]
#[command(name = "co16")]
#[command(version)]
#[command(about = "A 16-bit register machine with a breakpoint debugger")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct ImageArgs {
    /// Program image (hex/binary/decimal words, one per line)
    image: Option<String>,
    /// JSON shell configuration
    #[arg(short, long)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        #[command(flatten)]
        args: ImageArgs,
        /// Maximum number of instructions to execute
        #[arg(short, long, default_value = "100000")]
        max_steps: u64,
        /// Print each instruction before it executes
        #[arg(short, long)]
        trace: bool,
        /// Print the final machine state as JSON
        #[arg(long)]
        json: bool,
        /// Halt on the first execution fault
        #[arg(short, long)]
        exit_on_error: bool,
    },
    /// Interactive terminal debugger
    #[cfg(feature = "tui")]
    Debug {
        #[command(flatten)]
        args: ImageArgs,
    },
    /// Line-oriented debugger on stdin/stdout
    Repl {
        #[command(flatten)]
        args: ImageArgs,
    },
    /// Disassemble a program image
    Disasm {
        /// Program image; the demo program if omitted
        image: Option<String>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { args, max_steps, trace, json, exit_on_error }) => {
            run_program(&args, max_steps, trace, json, exit_on_error);
        }
        #[cfg(feature = "tui")]
        Some(Commands::Debug { args }) => {
            debug_program(&args);
        }
        Some(Commands::Repl { args }) => {
            repl_program(&args);
        }
        Some(Commands::Disasm { image }) => {
            disassemble_file(image.as_deref());
        }
        None => {
            println!("co16 v{}", env!("CARGO_PKG_VERSION"));
            println!("A 16-bit register machine with a breakpoint debugger");
            println!();
            println!("Use --help for available commands");
        }
    }
}

fn load_program(path: Option<&str>) -> ProgramImage {
    let Some(path) = path else {
        log::info!("no image given, using the demo program");
        return demo_program();
    };

    match load_image(path) {
        Ok(image) if image.is_empty() => {
            eprintln!("❌ No words to load in {}", path);
            std::process::exit(1);
        }
        Ok(image) => {
            log::info!("loaded {} words from {}", image.len(), path);
            image
        }
        Err(e) => {
            eprintln!("❌ Failed to load image: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_config(path: Option<&str>) -> ShellConfig {
    let Some(path) = path else {
        return ShellConfig::default();
    };

    match ShellConfig::load(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config: {}", e);
            std::process::exit(1);
        }
    }
}

fn open_session(args: &ImageArgs, exit_on_error: bool) -> Session {
    let image = load_program(args.image.as_deref());
    let mut config = load_config(args.config.as_deref());
    config.exit_on_error |= exit_on_error;

    match Session::new(image, config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("❌ Failed to load program: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_program(args: &ImageArgs, max_steps: u64, trace: bool, json: bool, exit_on_error: bool) {
    let mut session = open_session(args, exit_on_error);
    let controller = session.controller_mut();

    let mut steps = 0;
    let mut faults = 0;
    while steps < max_steps && controller.cpu().is_running() {
        if trace {
            let cpu = controller.cpu();
            let pc = cpu.regs.pc;
            println!("{:04X}: {}", pc, disassemble_word(cpu.mem.read(pc), cpu.mem.read(pc.wrapping_add(1))));
        }

        let outcome = controller.step();
        steps += 1;
        if let Some(fault) = outcome.fault {
            eprintln!("⚠️  {}", fault);
            faults += 1;
        }
    }
    let still_running = controller.cpu().is_running();

    if json {
        match serde_json::to_string_pretty(&session.controller().cpu().snapshot()) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("❌ Failed to serialize state: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        println!("━━━ Result ━━━");
        println!("Steps: {}  Faults: {}", steps, faults);
        for line in session.status_lines() {
            println!("{}", line);
        }
    }

    if still_running {
        eprintln!();
        eprintln!("⚠️  Reached max steps limit ({}). Use --max-steps to increase.", max_steps);
    }
}

#[cfg(feature = "tui")]
fn debug_program(args: &ImageArgs) {
    use co16::tui::run_debugger;

    let session = open_session(args, false);

    if let Err(e) = run_debugger(session) {
        eprintln!("❌ Debugger error: {}", e);
        std::process::exit(1);
    }
}

fn repl_program(args: &ImageArgs) {
    use co16::shell::run_repl;

    let mut session = open_session(args, false);
    let stdin = std::io::stdin();

    if let Err(e) = run_repl(&mut session, stdin.lock(), std::io::stdout()) {
        eprintln!("❌ I/O error: {}", e);
        std::process::exit(1);
    }
}

fn disassemble_file(path: Option<&str>) {
    let image = load_program(path);

    for segment in &image.segments {
        print!("{}", disassemble(&segment.words, segment.origin));
    }
}
