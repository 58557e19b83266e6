use embedded_hal_02::blocking::spi as hal02blocking;
use embedded_hal_02::spi as hal02;

use crate::block;
use crate::regs::Io;

use super::{Error, Master, Port};

impl<I, Mode> hal02::FullDuplex<u8> for Port<I, Mode>
where
    I: Io,
{
    type Error = Error;

    fn read(&mut self) -> block::Result<u8, Self::Error> {
        Port::read_one(self)
    }

    fn send(&mut self, word: u8) -> block::Result<(), Self::Error> {
        Port::write_one(self, word)
    }
}

impl<I> hal02blocking::Transactional<u8> for Port<I, Master>
where
    I: Io,
{
    type Error = Error;

    fn exec(&mut self, operations: &mut [hal02blocking::Operation<u8>]) -> Result<(), Self::Error> {
        use hal02blocking::Operation;

        for op in operations.iter_mut() {
            match op {
                Operation::Write(buf) => {
                    Port::write(self, buf)?;
                }
                Operation::Transfer(buf) => {
                    Port::transfer_in_place(self, buf)?;
                }
            }
        }

        Ok(())
    }
}

impl<I> hal02blocking::Transfer<u8> for Port<I, Master>
where
    I: Io,
{
    type Error = Error;

    fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], Self::Error> {
        Port::transfer_in_place(self, words)?;
        Ok(words)
    }
}

impl<I> hal02blocking::Write<u8> for Port<I, Master>
where
    I: Io,
{
    type Error = Error;

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        Port::write(self, words)
    }
}

impl<I> hal02blocking::WriteIter<u8> for Port<I, Master>
where
    I: Io,
{
    type Error = Error;

    fn write_iter<WI>(&mut self, words: WI) -> Result<(), Self::Error>
    where
        WI: IntoIterator<Item = u8>,
    {
        for word in words {
            Port::write_byte(self, word)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::device::Profile;
    use crate::regs::sim::{Echo, Loopback, Sim};
    use crate::spi;

    use embedded_hal_02::blocking::spi::{Operation, Transactional, Transfer, WriteIter};

    #[test]
    fn blocking_transfer() {
        let mut port = spi::new(Sim::new(Loopback), Profile::ATMEGA8).master();
        let mut words = [9, 8, 7];
        assert_eq!(Transfer::transfer(&mut port, &mut words), Ok(&[9, 8, 7][..]));
    }

    #[test]
    fn write_iter_then_exec() {
        let mut port = spi::new(Sim::new(Echo::new()), Profile::ATMEGA8).master();
        WriteIter::write_iter(&mut port, [1, 2, 3]).unwrap();
        port.io_mut().peer_mut().replay();

        let mut back = [0; 3];
        Transactional::exec(&mut port, &mut [Operation::Transfer(&mut back)]).unwrap();
        assert_eq!(back, [1, 2, 3]);
    }
}
