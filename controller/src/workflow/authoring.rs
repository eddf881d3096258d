use crate::workflow::config::ControllerConfig;
use crate::workflow::failure::Failure;
use crate::workflow::runner::load_parameters;
use anyhow::Context;
use log::info;
use std::path::Path;
use tcucore::codec::build_registers;
use tcucore::header::write_header;
use tcucore::{Pulse, TcuParameters};

/// Edits applied to a header file's pulse list.
#[derive(Debug, Clone)]
pub enum PulseEdit {
    Add(Pulse),
    Replace { index: usize, pulse: Pulse },
    Remove { index: usize },
}

/// Applies one edit and rewrites the header.
///
/// The edited parameters must still encode before the file is touched.
pub fn edit_header(
    path: &Path,
    edit: PulseEdit,
    config: &ControllerConfig,
) -> anyhow::Result<TcuParameters> {
    let mut params = load_parameters(path)?;
    let edited = match edit {
        PulseEdit::Add(pulse) => params.add_pulse(pulse),
        PulseEdit::Replace { index, pulse } => params.set_pulse(index, pulse),
        PulseEdit::Remove { index } => params.remove_pulse(index).map(|_| ()),
    };
    edited.map_err(Failure::Parameters)?;

    build_registers(
        &params,
        config.clock_period_ns_for(&params),
        config.endianness,
    )
    .map_err(Failure::Parameters)
    .context("checking edited parameters")?;

    write_header(path, &params).with_context(|| format!("writing {}", path.display()))?;
    info!(
        "{} now holds {} pulse(s)",
        path.display(),
        params.num_pulses()
    );
    Ok(params)
}
