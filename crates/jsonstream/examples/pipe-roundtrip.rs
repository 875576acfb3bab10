//! Pipe round trip: one thread writes framed values, another reassembles them
//! from deliberately tiny chunks.
//!
//! Run with:
//!   cargo run --example pipe-roundtrip

#[cfg(unix)]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::io::Read;
    use std::thread;

    use jsonstream::frame::{FrameReader, FrameWriter};
    use jsonstream::Value;

    let (tx, mut rx) = std::os::unix::net::UnixStream::pair()?;

    let producer = thread::spawn(move || -> jsonstream::frame::Result<()> {
        let greeting: Value = Value::Object(
            [("greeting".to_string(), Value::from("hello"))]
                .into_iter()
                .collect(),
        );

        let mut writer = FrameWriter::new(tx);
        writer.write(&greeting)?;
        writer.write(&vec![1, 2, 3])?;
        writer.write("三")?;
        writer.write(&Value::Null)?;
        Ok(())
    });

    // Seven bytes per read, so most frames cross a chunk boundary.
    let mut reader = FrameReader::new();
    let mut chunk = [0u8; 7];
    loop {
        let n = rx.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        for value in reader.consume(&chunk[..n])? {
            eprintln!("received: {value}");
        }
    }

    producer.join().map_err(|_| "producer panicked")??;
    reader.finish()?;
    Ok(())
}

#[cfg(not(unix))]
fn main() {
    eprintln!("pipe-roundtrip uses Unix socket pairs; run it on a Unix host");
}
