use ava_lang::config::{VERSION, WELCOME_MESSAGE, WELCOME_SUBTITLE};
use ava_lang::env::Environment;
use ava_lang::{builtins, run, run_with_env};
use clap::Parser as ClapParser;
use rustyline::error::ReadlineError;
use rustyline::{Config, Editor};
use std::path::PathBuf;

/// A small tree-walking interpreter producing a structured execution trace
#[derive(ClapParser, Debug)]
#[command(name = "ava-lang")]
#[command(version = VERSION)]
#[command(about = "Runs scripts and reports a structured execution trace")]
struct CliArgs {
    /// Script file to execute (optional - if not provided, starts REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    if let Some(script_path) = args.script {
        return run_script(&script_path);
    }

    run_repl()
}

fn run_script(path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read script file {}: {}", path.display(), e))?;
    let file_name = path.to_string_lossy().to_string();

    let trace = run(&file_name, &source);
    print!("{}", trace.stdout);

    if let Some(error) = &trace.error {
        eprint!("{}", error.traceback_str);
        std::process::exit(1);
    }

    Ok(())
}

fn run_repl() -> Result<(), Box<dyn std::error::Error>> {
    let env = Environment::new();
    builtins::register_builtins(&env);

    let config = Config::builder().auto_add_history(true).build();
    let mut rl: Editor<(), _> =
        Editor::with_config(config).map_err(|e| format!("Failed to initialize REPL: {}", e))?;

    let history_file = ".ava_history";
    let _ = rl.load_history(history_file);

    println!("{}", WELCOME_MESSAGE);
    println!("{}", WELCOME_SUBTITLE);

    loop {
        let readline = rl.readline("ava> ");

        match readline {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }

                let (trace, value) = run_with_env("<repl>", &line, env.clone());
                print!("{}", trace.stdout);

                match &trace.error {
                    Some(error) => eprint!("{}", error.traceback_str),
                    None => println!("{}", value),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    let _ = rl.save_history(history_file);
    Ok(())
}
