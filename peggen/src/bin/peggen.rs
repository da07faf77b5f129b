#[cfg(feature = "cli")]
mod real {
    use clap::Parser;
    use std::path::PathBuf;
    use std::process::ExitCode;

    #[derive(Parser)]
    #[command(about = "Generate a packrat parser module from a grammar file")]
    struct Args {
        /// Path to the input grammar file
        #[arg(short = 'g', long)]
        grammar: PathBuf,

        /// Path to write the generated source module
        #[arg(short = 'o', long)]
        out: PathBuf,

        /// Package name of the generated module
        #[arg(short = 'p', long, default_value = "parser")]
        package: String,
    }

    pub fn main() -> ExitCode {
        env_logger::init();
        let args = Args::parse();

        let text = match peggen::preprocess::preprocess(&args.grammar) {
            Ok(text) => text,
            Err(err) => {
                eprintln!("{err:#}");
                return ExitCode::from(1);
            }
        };

        let options = peggen::Options {
            package_name: args.package,
        };
        let output = match peggen::generate_with(&text, &options) {
            Ok(output) => output,
            Err(err) => {
                eprintln!("{err}");
                return ExitCode::from(err.exit_code());
            }
        };

        if let Err(err) = std::fs::write(&args.out, output) {
            eprintln!("can't write {}: {}", args.out.display(), err);
            return ExitCode::from(1);
        }
        ExitCode::SUCCESS
    }
}

#[cfg(feature = "cli")]
fn main() -> std::process::ExitCode {
    real::main()
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("peggen disabled (compiled without `cli` feature)");
}
