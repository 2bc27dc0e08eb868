use std::{
    fmt,
    io::{self, Read},
};

use rand::Rng;

pub const LIMITED: usize = 8 * 1024;

/// Reader that returns at most `limit` bytes per read.
pub struct Limited<T> {
    io: T,
    limit: usize,
    length: u64,
    eof: bool,
}

#[allow(dead_code)]
impl<T> Limited<T> {
    pub fn new(io: T, limit: usize) -> Self {
        tracing::info!("Limited stream by {}", limit);

        Self {
            io,
            limit,
            length: 0,
            eof: false,
        }
    }

    pub fn random(io: T) -> Self {
        Self::new(io, rand::thread_rng().gen_range(1..LIMITED))
    }

    pub fn random_with(io: T, max: usize) -> Self {
        Self::new(io, rand::thread_rng().gen_range(1..max))
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> u64 {
        self.length
    }
}

impl<T> fmt::Debug for Limited<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Limited")
            .field("eof", &self.eof)
            .field("limit", &self.limit)
            .field("length", &self.length)
            .finish()
    }
}

impl<T> Read for Limited<T>
where
    T: Read,
{
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, io::Error> {
        let max = buf.len().min(self.limit);
        let n = self.io.read(&mut buf[..max])?;
        if n == 0 {
            self.eof = true;
        }
        self.length += n as u64;
        Ok(n)
    }
}
