//! `deltasol detect` -- identify the device.

use std::fmt::Write;

use deltasol_core::{Controller, DeviceIdentity};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

fn detail(device: &DeviceIdentity) -> String {
    let protocol = match device.protocol() {
        Some(p) => format!("{p:?}"),
        None => "unsupported".into(),
    };

    let mut out = String::new();
    let _ = writeln!(out, "Product:   {} ({})", device.product_name.to_uppercase(), device.product);
    let _ = writeln!(out, "Protocol:  {protocol}");
    let _ = writeln!(out, "Name:      {}", device.title());
    let _ = writeln!(out, "Vendor:    {}", device.vendor);
    let _ = writeln!(out, "Serial:    {}", device.serial_number);
    let _ = writeln!(out, "MAC:       {}", device.mac_address);
    let _ = write!(
        out,
        "Firmware:  {} (build {})",
        device.firmware_version, device.firmware_build
    );
    out
}

pub async fn handle(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let device = controller.detect().await?;
    let out = output::render_single(&global.output, device.as_ref(), detail, |d| {
        d.product.to_string()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
