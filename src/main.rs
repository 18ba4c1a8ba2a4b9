use std::process::ExitCode;

use bloodtype_mpc::{
    check_output, error::MpcError, oracle::BloodType, random::entropy_rng, self_test,
    sharing::f2_to_u8, simulate_circuit_lockstep, simulate_table_lockstep,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Blood type compatibility without revealing either blood type.
///
/// Blood types are given as a 3-bit code (bit0 = A antigen, bit1 = B antigen,
/// bit2 = Rh) or by name, e.g. `5` or `A+`. Set RUST_LOG=debug for protocol logs.
#[derive(Parser, Debug)]
#[command(version, about, long_about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate the boolean circuit with Beaver triples.
    CircuitDemo {
        recipient: BloodType,
        donor: BloodType,
    },
    /// Evaluate with a masked lookup into a one-time truth table.
    TableDemo {
        recipient: BloodType,
        donor: BloodType,
    },
    /// Run both protocols on all 64 input pairs.
    SelfTest,
}

fn run(command: Command) -> Result<(), MpcError> {
    let mut rng = entropy_rng()?;
    let (recipient, donor, z) = match command {
        Command::CircuitDemo { recipient, donor } => {
            let z = simulate_circuit_lockstep(&mut rng, recipient, donor, |s| println!("{s}"))?;
            (recipient, donor, z)
        }
        Command::TableDemo { recipient, donor } => {
            let z = simulate_table_lockstep(&mut rng, recipient, donor, |s| println!("{s}"))?;
            (recipient, donor, z)
        }
        Command::SelfTest => {
            let checks = self_test(&mut rng)?;
            println!("{checks} checks passed");
            println!("Success");
            return Ok(());
        }
    };

    println!(
        "Securely computed f({},{})={}",
        recipient.code(),
        donor.code(),
        f2_to_u8(z)
    );
    check_output(recipient, donor, z)?;
    println!("Success");
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("Error");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
