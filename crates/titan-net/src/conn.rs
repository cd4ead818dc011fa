// SPDX-License-Identifier: Apache-2.0

//! A thin wrapper handing the worker loop's `mio::net::TcpStream` to the
//! pipeline as a [`ClientConn`], so the pipeline reads and writes through
//! a trait object instead of ever needing the raw fd itself.

use std::io::{self, Read, Write};

use titan_pipeline::ClientConn;

pub struct MioClientConn<'a> {
    stream: &'a mut mio::net::TcpStream,
}

impl<'a> MioClientConn<'a> {
    pub fn new(stream: &'a mut mio::net::TcpStream) -> Self {
        Self { stream }
    }
}

impl ClientConn for MioClientConn<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }
}
