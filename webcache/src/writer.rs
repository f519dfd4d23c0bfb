//! `std::io::Write` adapter so producers can stream straight into the
//! staging buffer (`write!`, `io::copy`, serializers taking a writer).

use std::io;

use crate::page::CachedPage;

impl io::Write for &CachedPage {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        CachedPage::write(*self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
