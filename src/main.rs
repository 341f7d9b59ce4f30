use clap::CommandFactory;
use ivol::{
    Cli, Config, IvolError, IvolResults, OutputFormatter, OutputMode, RunParameters,
    TerminalPrompt, UserFriendlyError,
};
use std::process;

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    let cli = Cli::parse_normalized();

    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let ivol = match IvolResults::from_cli(&cli) {
        Ok(ivol) => ivol,
        Err(e) => {
            print_startup_error(&e, cli.output_mode());
            return exit_code_for(&e);
        }
    };

    let params = match cli.run_parameters(ivol.config()) {
        Ok(params) => params,
        Err(e) => {
            ivol.handle_error(&e);
            if matches!(e, IvolError::MissingArgument { .. }) {
                eprintln!();
                eprintln!("{}", Cli::command().render_usage());
            }
            return exit_code_for(&e);
        }
    };

    if cli.dry_run {
        return handle_dry_run(&ivol, &params);
    }

    let result = ivol
        .resolve_output(&params, &mut TerminalPrompt::new())
        .and_then(|target| ivol.run(&params, &target));

    match result {
        Ok(report) => {
            ivol.output_formatter().print_run_report(&report);
            0
        }
        Err(e) => {
            ivol.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn exit_code_for(error: &IvolError) -> i32 {
    match error {
        IvolError::Cancelled => 130, // Interrupted (SIGINT)
        IvolError::MissingArgument { .. } | IvolError::InvalidResponse { .. } => 2,
        IvolError::SourceUnavailable { .. } => 3,
        IvolError::UnknownStep { .. } => 4,
        IvolError::UnknownPartInstance { .. } => 5,
        IvolError::MissingFieldOutput { .. }
        | IvolError::MissingFrame { .. }
        | IvolError::FrameMismatch { .. }
        | IvolError::InvalidTensor { .. } => 6,
        IvolError::OutputExists { .. } => 7,
        _ => 1, // General error
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "ivol.toml".to_string());

    match IvolResults::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  ivol --odb Job-2 --part-instance PART-1-1 --crimp-step crimp-1 --last-step unload-3 --config {}", config_path);
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn handle_dry_run(ivol: &IvolResults, params: &RunParameters) -> i32 {
    let formatter = ivol.output_formatter();

    formatter.info("DRY RUN MODE - no results file will be written");
    formatter.print_separator();

    let mut session = match ivol.open_session(params) {
        Ok(session) => session,
        Err(e) => {
            ivol.handle_error(&e);
            return exit_code_for(&e);
        }
    };
    formatter.success(&format!(
        "Steps {} and {} and part instance {} found",
        params.crimp_step, params.last_step, params.part_instance
    ));

    let frames = ivol.read_frames(&session, params);
    let closed = ivol.close_session(&mut session);
    let frames = match frames.and_then(|frames| closed.map(|_| frames)) {
        Ok(frames) => frames,
        Err(e) => {
            ivol.handle_error(&e);
            return exit_code_for(&e);
        }
    };

    let target = ivol.output_manager(params);
    print_plan(ivol.config(), params, frames.pre.len(), &target.target().display().to_string());

    formatter.print_separator();
    formatter.success("Dry run completed successfully");
    0
}

fn print_plan(config: &Config, params: &RunParameters, rows: usize, target: &str) {
    println!("  Archive:            {}", params.odb.display());
    println!("  Conditioning:       {}", params.conditioning_odb().display());
    println!("  Integration points: {}", rows);
    println!(
        "  Fields:             {}, {}, {}, {}",
        config.fields.strain, config.fields.stress, config.fields.volume, config.fields.phase_fraction
    );
    println!("  Output file:        {}", target);
    if params.overwrite {
        println!("  Existing output file would be overwritten");
    }
}

fn print_startup_error(error: &IvolError, mode: OutputMode) {
    let formatter = OutputFormatter::new(mode, 0, false);
    formatter.print_user_friendly_error(error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code_for(&IvolError::Cancelled), 130);
        assert_eq!(
            exit_code_for(&IvolError::MissingArgument { name: "--odb".to_string() }),
            2
        );
        assert_eq!(
            exit_code_for(&IvolError::UnknownPartInstance {
                instance: "X".to_string(),
                archive: "Job-2.odb".to_string(),
                available: vec![],
            }),
            5
        );
        assert_eq!(
            exit_code_for(&IvolError::OutputExists { path: "a.csv".to_string() }),
            7
        );
        assert_eq!(
            exit_code_for(&IvolError::Config { message: "bad".to_string() }),
            1
        );
    }

    #[test]
    fn test_generate_config_command() {
        use clap::Parser;

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");
        let cli = Cli::parse_from([
            "ivol",
            "--generate-config",
            "--config",
            config_path.to_str().unwrap(),
        ]);

        assert_eq!(handle_generate_config(&cli), 0);
        let content = std::fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[fields]"));
    }
}
