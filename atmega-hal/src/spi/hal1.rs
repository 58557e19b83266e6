use embedded_hal_1::spi as hal1;
use embedded_hal_nb::spi as hal1nb;

use crate::block;
use crate::regs::Io;

use super::{Device, Error, Master, Port};

impl<I, Mode> hal1::ErrorType for Port<I, Mode>
where
    I: Io,
{
    type Error = Error;
}

impl<I> hal1::SpiBus<u8> for Port<I, Master>
where
    I: Io,
{
    #[inline(always)]
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        Port::read(self, words)
    }

    #[inline(always)]
    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        Port::write(self, words)
    }

    #[inline(always)]
    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        Port::transfer(self, read, write)
    }

    #[inline(always)]
    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        Port::transfer_in_place(self, words)
    }

    #[inline(always)]
    fn flush(&mut self) -> Result<(), Self::Error> {
        // every transfer waits for SPIF before returning
        Ok(())
    }
}

impl<I> hal1::ErrorType for Device<I>
where
    I: Io,
{
    type Error = Error;
}

impl<I> hal1::SpiDevice<u8> for Device<I>
where
    I: Io,
{
    fn transaction(
        &mut self,
        operations: &mut [hal1::Operation<'_, u8>],
    ) -> Result<(), Self::Error> {
        let port = self.port_mut();
        port.slave_select_active();

        let mut inner = || -> Result<(), Self::Error> {
            for op in operations.iter_mut() {
                match op {
                    hal1::Operation::Read(buf) => port.read(buf)?,
                    hal1::Operation::Write(buf) => port.write(buf)?,
                    hal1::Operation::Transfer(read, write) => port.transfer(read, write)?,
                    hal1::Operation::TransferInPlace(buf) => port.transfer_in_place(buf)?,
                    hal1::Operation::DelayNs(ns) => {
                        for _ in 0..delay_spins(*ns) {
                            core::hint::spin_loop();
                        }
                    }
                }
            }
            Ok(())
        };
        let result = inner();

        port.slave_select_inactive();
        result
    }
}

// no clock source to lean on. at 16MHz a spin is at least 62.5ns, so
// round up to 64ns per spin
fn delay_spins(ns: u32) -> u32 {
    ns.div_ceil(64)
}

impl<I, Mode> hal1nb::FullDuplex<u8> for Port<I, Mode>
where
    I: Io,
{
    #[inline(always)]
    fn read(&mut self) -> block::Result<u8, Self::Error> {
        Port::read_one(self)
    }

    #[inline(always)]
    fn write(&mut self, word: u8) -> block::Result<(), Self::Error> {
        Port::write_one(self, word)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::device::Profile;
    use crate::regs::registers::PORT_B;
    use crate::regs::sim::{Echo, Loopback, Sim, Stalled};
    use crate::spi;
    use crate::block::Timeout;

    use embedded_hal_1::spi::{Error as _, ErrorKind, Operation, SpiBus, SpiDevice};
    use embedded_hal_nb::spi::FullDuplex;

    #[test]
    fn bus() {
        let mut port = spi::new(Sim::new(Loopback), Profile::ATMEGA8).master();
        let mut read = [0; 3];
        SpiBus::transfer(&mut port, &mut read, &[1, 2, 3]).unwrap();
        assert_eq!(read, [1, 2, 3]);
        SpiBus::flush(&mut port).unwrap();
    }

    #[test]
    fn device_transaction() {
        let port = spi::new(Sim::new(Echo::new()), Profile::ATMEGA8).master();
        let mut device = port.into_device();

        device
            .transaction(&mut [Operation::Write(&[0xa5]), Operation::DelayNs(100)])
            .unwrap();
        device.port_mut().io_mut().peer_mut().replay();

        let mut read = [0; 2];
        device
            .transaction(&mut [Operation::Read(&mut read)])
            .unwrap();
        assert_eq!(read, [0xa5, 0x00]);

        // SS=PB2 back high
        let mut port = device.free();
        assert_eq!(port.io_mut().peek(PORT_B.port), 0b0000_0100);
        assert_eq!(port.io_mut().transfers(), 3);
    }

    #[test]
    fn device_releases_on_error() {
        let mut port = spi::new(Sim::new(Stalled), Profile::ATMEGA128).master();
        port.set_timeout(Timeout::Polls(3));
        let mut device = port.into_device();

        let err = device.write(&[1, 2]).unwrap_err();
        assert_eq!(err, Error::Timeout);
        assert_eq!(err.kind(), ErrorKind::Other);

        let mut port = device.free();
        assert_eq!(port.io_mut().peek(PORT_B.port), 0b0000_0001);
        assert_eq!(port.io_mut().transfers(), 1);
    }

    #[test]
    fn delay_rounds_up() {
        assert_eq!(delay_spins(0), 0);
        assert_eq!(delay_spins(1), 1);
        assert_eq!(delay_spins(64), 1);
        assert_eq!(delay_spins(65), 2);
        assert_eq!(delay_spins(u32::MAX), 1 << 26);
    }

    #[test]
    fn full_duplex_slave() {
        let mut port = spi::new(Sim::new(Loopback), Profile::ATMEGA8).slave();
        FullDuplex::write(&mut port, 0x42).unwrap();
        assert_eq!(FullDuplex::read(&mut port), Ok(0x42));
        assert_eq!(FullDuplex::read(&mut port), Err(block::Error::WouldBlock));
    }
}
