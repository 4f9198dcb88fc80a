use clap::Parser;
use job_autofill::cli::commands::{
    cmd_classify, cmd_download, cmd_fill, cmd_inspect, cmd_payload, cmd_scan,
};
use job_autofill::cli::config::{
    Cli, Commands, build_browser_launch, build_http_options, build_scan_options, load_config,
};
use job_autofill::logging::init_logging;
use job_autofill::trace::logger::TraceLogger;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(cli.config.as_deref());

    // Trace path: CLI > config > disabled
    let tracer = match cli.trace.as_deref().or(config.trace.path.as_deref()) {
        Some(path) => TraceLogger::new(path),
        None => TraceLogger::disabled(),
    };
    let launch = build_browser_launch(&config.browser);
    let http = build_http_options(&config.http);

    match cli.command {
        Commands::Scan {
            url,
            fields_out,
            target_out,
            no_follow_apply,
            wait_until,
        } => {
            let options = build_scan_options(&config.browser, wait_until.as_deref(), no_follow_apply);
            cmd_scan(
                &url,
                fields_out.as_deref(),
                target_out.as_deref(),
                &options,
                &launch,
                &tracer,
            )?;
        }
        Commands::Inspect {
            html,
            url,
            fields_out,
        } => {
            let options = build_scan_options(&config.browser, None, true);
            cmd_inspect(&html, &url, fields_out.as_deref(), &options, &tracer)?;
        }
        Commands::Classify { url, html } => {
            cmd_classify(&url, html.as_deref(), &http)?;
        }
        Commands::Fill { url, submit } => {
            let options = build_scan_options(&config.browser, None, false);
            cmd_fill(&url, submit, &config.candidate, &options, &launch, &tracer)?;
        }
        Commands::Payload { fields, action } => {
            cmd_payload(&fields, action.as_deref(), &http)?;
        }
        Commands::Download { url, out_dir, name } => {
            cmd_download(&url, &out_dir, name.as_deref(), &http)?;
        }
    }

    Ok(())
}
