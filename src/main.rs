//! Binary entry point for the Selectel Docker Machine driver.

use std::env;
use std::io::{self, Write};
use std::process;

use camino::Utf8PathBuf;
use clap::Parser;
use thiserror::Error;
use tracing::warn;
use tracing_subscriber::{EnvFilter, Registry, prelude::*};

use selectel_machine::{
    CloudError, ConfigError, DRIVER_NAME, Driver, DriverConfig, DriverError, MachineRecord,
    OpenStackClient, PollConfig, PollConfigError, RemovalReport,
};

mod cli;

use cli::{Cli, CreateCommand, DriverFlags, RecordArgs};

const LOG_FORMAT_ENV: &str = "SEL_LOG_FORMAT";

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("polling configuration error: {0}")]
    Poll(#[from] PollConfigError),
    #[error("cloud error: {0}")]
    Cloud(#[from] CloudError),
    #[error(transparent)]
    Driver(#[from] DriverError),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

/// Logs go to stderr so stdout stays reserved for command output.
fn init_tracing() {
    let format = env::var(LOG_FORMAT_ENV).unwrap_or_default();
    let logger = match format.as_str() {
        "json" => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(io::stderr)
            .boxed(),
        "pretty" => tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(io::stderr)
            .boxed(),
        _ => tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(io::stderr)
            .boxed(),
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    Registry::default()
        .with(logger)
        .with(env_filter)
        .try_init()
        .ok();
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    match cli {
        Cli::Create(command) => create(*command).await,
        Cli::Remove(args) => {
            let report = connect(&args).await?.remove().await;
            log_report(&report);
            Ok(())
        }
        Cli::Start(args) => Ok(connect(&args).await?.start().await?),
        Cli::Stop(args) => Ok(connect(&args).await?.stop().await?),
        Cli::Restart(args) => Ok(connect(&args).await?.restart().await?),
        Cli::Kill(args) => Ok(connect(&args).await?.kill().await?),
        Cli::State(args) => {
            let state = connect(&args).await?.get_state().await?;
            print_line(&state.to_string())
        }
        Cli::Ip(args) => address_command(&args, AddressKind::Ip).await,
        Cli::Url(args) => address_command(&args, AddressKind::Url).await,
        Cli::SshHostname(args) => address_command(&args, AddressKind::SshHostname).await,
        Cli::DriverName => print_line(DRIVER_NAME),
    }
}

/// Runs the full provisioning sequence and prints the resulting record.
///
/// The record is printed even when provisioning fails part-way, so the host
/// can hand it to `remove`.
async fn create(command: CreateCommand) -> Result<(), CliError> {
    let record = MachineRecord::from_flags(&command.machine_name, driver_config(command.flags))?;
    let polling = PollConfig::load_without_cli_args()?;
    let client = OpenStackClient::connect(&record.config.auth_options()).await?;
    let mut driver = Driver::new(record, client).with_polling(polling);

    let outcome = provision(&mut driver).await;
    print_line(&driver.record().to_json()?)?;
    Ok(outcome?)
}

async fn provision(driver: &mut Driver<OpenStackClient>) -> Result<(), DriverError> {
    driver.pre_create_check().await?;
    driver.create().await?;
    driver.get_ip().await?;
    Ok(())
}

#[derive(Clone, Copy)]
enum AddressKind {
    Ip,
    Url,
    SshHostname,
}

/// Prints an address of the machine, writing the record back to `--record`
/// when a floating IP was attached on the way.
async fn address_command(args: &RecordArgs, kind: AddressKind) -> Result<(), CliError> {
    let mut driver = connect(args).await?;
    let had_address = driver.record().ip_address.is_some();
    let output = match kind {
        AddressKind::Ip => driver.get_ip().await?,
        AddressKind::Url => driver.get_url().await?,
        AddressKind::SshHostname => driver.get_ssh_hostname().await?,
    };
    if !had_address {
        driver.record().save(&args.record)?;
    }
    print_line(&output)
}

async fn connect(args: &RecordArgs) -> Result<Driver<OpenStackClient>, CliError> {
    let record = MachineRecord::load(&args.record)?;
    let polling = PollConfig::load_without_cli_args()?;
    let client = OpenStackClient::connect(&record.config.auth_options()).await?;
    Ok(Driver::new(record, client).with_polling(polling))
}

fn driver_config(flags: DriverFlags) -> DriverConfig {
    DriverConfig {
        auth_url: flags.auth_url,
        domain_name: flags.domain_name,
        username: flags.username,
        password: flags.password,
        project_id: flags.project_id,
        region: flags.region,
        availability_zone: flags.availability_zone,
        flavor_id: flags.flavor_id,
        flavor_name: flags.flavor_name,
        image_id: flags.image_id,
        image_name: flags.image_name,
        network_id: flags.network_id,
        ssh_user: flags.ssh_user,
        ssh_port: flags.ssh_port,
        ssh_key_name: flags.ssh_key_name,
        ssh_private_key_path: flags.ssh_private_key_path,
        ssh_public_key_path: Utf8PathBuf::new(),
        volume_name: flags.volume_name,
        volume_type: flags.volume_type,
        volume_size: flags.volume_size,
        server_name: flags.server_name,
        proxy: flags.proxy,
        cpu: flags.cpu,
        ram: flags.ram,
    }
}

fn log_report(report: &RemovalReport) {
    for failure in &report.failures {
        warn!(step = %failure.step, target = %failure.target, "left behind after removal");
    }
}

fn print_line(value: &str) -> Result<(), CliError> {
    writeln!(io::stdout(), "{value}")?;
    Ok(())
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
