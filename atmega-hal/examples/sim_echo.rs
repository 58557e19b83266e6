//! Run the drivers against the simulated register file on the host.
//!
//! The SPI peer records what it hears and, when told to, says it all
//! back, so whatever is written can be read again.

use atmega_hal::device::Profile;
use atmega_hal::regs::sim::{Echo, Sim};
use atmega_hal::spi::{self, BitOrder, Mode, Settings, MAX_STRING_LENGTH};
use atmega_hal::{block::Timeout, exint};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let profile = Profile::ATMEGA128;

    let mut ints = exint::new(Sim::new(Echo::new()), profile);
    ints.setup_int4_falling_edge()?;
    ints.setup_int7_logical_change()?;
    if let Err(e) = ints.setup_int0_logical_change() {
        println!("{}: {}", profile.name, e);
    }
    println!("INT4 sense: {:?}", ints.sense(exint::Line::Int4)?);

    // same register file, now for SPI
    let sim = ints.free();
    let mut port = spi::new(sim, profile)
        .settings(Settings {
            bit_order: BitOrder::MsbFirst,
            mode: Mode::MODE_0,
        })
        .timeout(Timeout::Polls(100))
        .master();

    port.slave_select_active();
    port.write_string("hello, AVR")?;
    port.write_int(-1234)?;
    port.slave_select_inactive();

    port.io_mut().peer_mut().replay();
    port.slave_select_active();

    let mut buffer = [0; MAX_STRING_LENGTH];
    let text = port.read_string(&mut buffer)?;
    println!("string: {:?}", text);
    println!("int: {}", port.read_int()?);
    port.slave_select_inactive();

    println!("{} transfers", port.io_mut().transfers());
    Ok(())
}
