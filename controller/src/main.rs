use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use device::{DeviceSession, DryRun, EmulatedTcu};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tcucore::codec::build_registers;
use tcucore::hdl::{render_summary, render_vhdl};
use tcucore::{Endianness, Pulse};
use workflow::authoring::{edit_header, PulseEdit};
use workflow::config::ControllerConfig;
use workflow::failure::Failure;
use workflow::runner::{load_parameters, Runner};

mod device;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Startup script for the NeXtRAD Timing Control Unit")]
struct Args {
    /// Load controller settings from YAML
    #[arg(long, global = true)]
    workflow: Option<PathBuf>,
    /// Clock period in ns, overriding the header's CLOCK_PERIOD_NS
    #[arg(long, global = true)]
    clock_period_ns: Option<u32>,
    /// Register byte order: big or little
    #[arg(long, global = true)]
    endianness: Option<Endianness>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SessionKind {
    /// Log the board shell commands without a live connection
    DryRun,
    /// Keep registers in memory
    Emulated,
}

#[derive(Subcommand)]
enum Command {
    /// Write the header's parameters to the TCU, verify them and arm
    Arm {
        file: PathBuf,
        /// IP address of the TCU
        address: Option<String>,
        /// .bof executable to run on the RHINO
        #[arg(short, long)]
        bof: Option<String>,
        /// SSH login timeout in seconds
        #[arg(short, long)]
        timeout: Option<u64>,
        #[arg(long, value_enum, default_value_t = SessionKind::DryRun)]
        session: SessionKind,
        /// Stop after verification
        #[arg(long, default_value_t = false)]
        no_arm: bool,
    },
    /// Print the parameter and pulse tables with their encodings
    Show { file: PathBuf },
    /// Print a VHDL register initialisation snippet
    Hdl { file: PathBuf },
    /// Print the register image
    Registers {
        file: PathBuf,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Append a pulse, or replace one with --index
    AddPulse {
        file: PathBuf,
        #[arg(long)]
        width: f64,
        #[arg(long)]
        pri: f64,
        #[arg(long)]
        mode: u16,
        #[arg(long)]
        frequency: u32,
        #[arg(long)]
        index: Option<usize>,
    },
    /// Remove the pulse at an index
    RemovePulse {
        file: PathBuf,
        #[arg(long)]
        index: usize,
    },
}

fn run_arm<S: DeviceSession>(
    config: ControllerConfig,
    session: S,
    file: &Path,
) -> anyhow::Result<()> {
    info!(
        "initializing TCU at IP [{}] with header file at [{}], this should take a moment...",
        config.address,
        file.display()
    );
    let params = load_parameters(file)?;
    let mut runner = Runner::new(config, session);
    let result = runner.execute(&params)?;
    println!(
        "TCU {} -> pulses {}, repeats {}, registers {}",
        if result.armed { "armed" } else { "configured" },
        result.readback.num_pulses,
        result.readback.num_repeats,
        result.image.len()
    );
    if let Some(status) = result.status {
        println!("status {}", status);
    }
    Ok(())
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = match &args.workflow {
        Some(path) => ControllerConfig::load(path)?,
        None => ControllerConfig::default(),
    }
    .with_overrides(args.clock_period_ns, args.endianness);

    match args.command {
        Command::Arm {
            file,
            address,
            bof,
            timeout,
            session,
            no_arm,
        } => {
            let config = ControllerConfig {
                address: address.unwrap_or(config.address),
                bof: bof.unwrap_or(config.bof),
                login_timeout_s: timeout.unwrap_or(config.login_timeout_s),
                arm: config.arm && !no_arm,
                ..config
            };
            match session {
                SessionKind::DryRun => {
                    let session = DryRun::new(config.address.clone(), config.login_timeout_s);
                    run_arm(config, session, &file)
                }
                SessionKind::Emulated => run_arm(config, EmulatedTcu::new(), &file),
            }
        }
        Command::Show { file } => {
            let params = load_parameters(&file)?;
            let clock_period_ns = config.clock_period_ns_for(&params);
            let summary = render_summary(&params, clock_period_ns, config.endianness)
                .map_err(Failure::Parameters)?;
            print!("{}", summary);
            Ok(())
        }
        Command::Hdl { file } => {
            let params = load_parameters(&file)?;
            let clock_period_ns = config.clock_period_ns_for(&params);
            let snippet = render_vhdl(&params, clock_period_ns, config.endianness)
                .map_err(Failure::Parameters)?;
            println!("copy this into HDL:");
            print!("{}", snippet);
            Ok(())
        }
        Command::Registers { file, json } => {
            let params = load_parameters(&file)?;
            let clock_period_ns = config.clock_period_ns_for(&params);
            let image = build_registers(&params, clock_period_ns, config.endianness)
                .map_err(Failure::Parameters)?;
            if json {
                let rendered = serde_json::to_string_pretty(&image.to_literals())
                    .context("serializing register image")?;
                println!("{}", rendered);
            } else {
                for (register, word) in image.iter() {
                    println!("{:<16} {}", register.name(), word.to_hdl_literal());
                }
            }
            Ok(())
        }
        Command::AddPulse {
            file,
            width,
            pri,
            mode,
            frequency,
            index,
        } => {
            let pulse = Pulse::new(width, pri, mode, frequency);
            let edit = match index {
                Some(index) => PulseEdit::Replace { index, pulse },
                None => PulseEdit::Add(pulse),
            };
            edit_header(&file, edit, &config)?;
            Ok(())
        }
        Command::RemovePulse { file, index } => {
            edit_header(&file, PulseEdit::Remove { index }, &config)?;
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            let code = err
                .downcast_ref::<Failure>()
                .map(Failure::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}
