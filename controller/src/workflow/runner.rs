use crate::device::DeviceSession;
use crate::workflow::config::ControllerConfig;
use crate::workflow::failure::Failure;
use anyhow::Context;
use std::path::Path;
use tcucore::codec::{
    build_registers, decode_registers, verify, Register, RegisterImage, TcuStatus,
};
use tcucore::header::read_header;
use tcucore::telemetry::LogManager;
use tcucore::{Readback, TcuParameters};

#[derive(Debug)]
pub struct WorkflowResult {
    pub image: RegisterImage,
    pub readback: Readback,
    pub armed: bool,
    /// Status flags read after arming.
    pub status: Option<TcuStatus>,
}

/// Loads a header file, mapping failures onto the documented exit codes.
pub fn load_parameters(path: &Path) -> anyhow::Result<TcuParameters> {
    if !path.is_file() {
        return Err(Failure::HeaderNotFound(path.to_path_buf()).into());
    }
    let params = read_header(path).map_err(|source| Failure::HeaderInvalid {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(params)
}

/// Drives one configure-verify-arm cycle against a device session.
pub struct Runner<S: DeviceSession> {
    config: ControllerConfig,
    session: S,
    logger: LogManager,
}

impl<S: DeviceSession> Runner<S> {
    pub fn new(config: ControllerConfig, session: S) -> Self {
        Self {
            config,
            session,
            logger: LogManager::with_target("tcu_controller"),
        }
    }

    #[cfg(test)]
    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn execute(&mut self, params: &TcuParameters) -> anyhow::Result<WorkflowResult> {
        let clock_period_ns = self.config.clock_period_ns_for(params);
        let endianness = self.config.endianness;

        self.logger.step("building register image");
        let image = build_registers(params, clock_period_ns, endianness)
            .map_err(Failure::Parameters)
            .context("building register image")?;
        for (register, word) in image.iter() {
            self.logger
                .detail(&format!("{} <= {}", register, word.to_hdl_literal()));
        }

        self.logger
            .step(&format!("connecting to TCU at {}", self.config.address));
        self.session
            .connect()
            .map_err(Failure::Session)
            .context("connecting to board")?;

        let outcome = self.configure(params, &image, clock_period_ns);
        let closed = self.session.disconnect();
        let (readback, status) = outcome?;
        closed
            .map_err(Failure::Session)
            .context("closing board session")?;

        self.logger.record("script completed successfully");
        Ok(WorkflowResult {
            image,
            readback,
            armed: status.is_some(),
            status,
        })
    }

    fn configure(
        &mut self,
        params: &TcuParameters,
        image: &RegisterImage,
        clock_period_ns: u32,
    ) -> anyhow::Result<(Readback, Option<TcuStatus>)> {
        let endianness = self.config.endianness;

        self.session
            .ensure_running(&self.config.bof)
            .map_err(Failure::Session)
            .with_context(|| format!("launching {}", self.config.bof))?;

        self.logger.step("sending params to TCU");
        for (register, word) in image.iter() {
            self.session
                .write_register(register.name(), word.as_bytes())
                .map_err(Failure::Session)
                .with_context(|| format!("writing register {}", register))?;
        }

        self.logger.step("verifying TCU registers");
        let mut raw = Vec::with_capacity(Register::ALL.len());
        for register in Register::ALL {
            let bytes = self
                .session
                .read_register(register.name())
                .map_err(Failure::Session)
                .with_context(|| format!("reading register {}", register))?;
            raw.push((register.name(), bytes));
        }
        let observed = RegisterImage::from_raw(raw).map_err(Failure::Parameters)?;
        let readback = decode_registers(&observed, clock_period_ns, endianness)
            .map_err(Failure::Parameters)
            .context("decoding register readback")?;
        let mismatches = verify(params, &readback, clock_period_ns).map_err(Failure::Parameters)?;
        if !mismatches.is_empty() {
            for mismatch in &mismatches {
                self.logger.caution(&format!("register mismatch: {}", mismatch));
            }
            return Err(Failure::Mismatch(mismatches)).context("verifying registers");
        }
        self.logger.record("all registers verified");

        if !self.config.arm {
            self.logger.record("arming skipped");
            return Ok((readback, None));
        }
        self.logger.step("arming TCU");
        self.session
            .arm(endianness)
            .map_err(Failure::Session)
            .context("arming TCU")?;
        self.logger.record("TCU armed");

        let status = self
            .session
            .status(endianness)
            .map_err(Failure::Session)
            .context("reading TCU status")?;
        if status.present() {
            self.logger.record(&format!("TCU status: {}", status));
        } else {
            self.logger
                .caution(&format!("TCU status {} is missing its present bit", status));
        }
        Ok((readback, Some(status)))
    }
}
