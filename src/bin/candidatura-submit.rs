use std::path::PathBuf;
use std::process::ExitCode;

use candidatura::form_client::{FilePick, FormData, FormHandler, LogNotifier};
use clap::{Arg, ArgMatches, Command};
use tracing_subscriber::EnvFilter;

const TEXT_FIELDS: [(&str, &str, bool); 6] = [
    ("nome", "Full name", true),
    ("idade", "Age in years", true),
    ("pais", "Country", false),
    ("provincia", "Province", false),
    ("email", "Email address", true),
    ("whatsapp", "WhatsApp number", true),
];

fn cli() -> Command<'static> {
    let mut command = Command::new("candidatura-submit")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Submit an application to a running candidatura server")
        .arg(
            Arg::new("server")
                .short('s')
                .long("server")
                .value_name("URL")
                .help("Base URL of the server")
                .default_value("http://localhost:3000"),
        )
        .arg(
            Arg::new("foto")
                .short('f')
                .long("foto")
                .value_name("FILE")
                .help("Photo to attach")
                .takes_value(true),
        );

    for (name, help, required) in TEXT_FIELDS {
        command = command.arg(
            Arg::new(name)
                .long(name)
                .value_name("VALUE")
                .help(help)
                .takes_value(true)
                .required(required),
        );
    }
    command
}

async fn run(matches: &ArgMatches) -> candidatura::error::Result<()> {
    let server = matches
        .get_one::<String>("server")
        .map(String::as_str)
        .unwrap_or("http://localhost:3000");

    let mut form = FormData::new();
    for (name, _, _) in TEXT_FIELDS {
        if let Some(value) = matches.get_one::<String>(name) {
            form.set(name, value.as_str());
        }
    }
    if let Some(path) = matches.get_one::<String>("foto") {
        form.set_photo(FilePick::from_path(&PathBuf::from(path)).await?);
    }

    let handler = FormHandler::new(server, LogNotifier)?;
    let response = handler.submit(&mut form).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("candidatura=info")),
        )
        .init();

    let matches = cli().get_matches();
    match run(&matches).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("candidatura-submit: {err}");
            ExitCode::FAILURE
        }
    }
}
