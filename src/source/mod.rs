use std::io;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::oneshot;

use crate::sample::AZ_ALT_PAYLOAD_LEN;
use crate::tracker::{Tracker, TrackerError};

/// Read fixed-size azimuth/altitude frames from a character device (a serial
/// line already configured for the sensor, or a FIFO fed by a BLE bridge)
/// until the stream ends, the tracker stops, or `stop_rx` fires.
pub async fn run_device_reader(
    path: &Path,
    tracker: Arc<Tracker>,
    stop_rx: oneshot::Receiver<()>,
) -> io::Result<u64> {
    let mut device = tokio::fs::File::open(path).await?;
    log::info!("Reading samples from {}", path.display());
    let frames = read_frames(&mut device, &tracker, stop_rx).await?;
    log::info!("Sample reader on {} finished after {} frames", path.display(), frames);
    Ok(frames)
}

pub async fn read_frames<R: AsyncRead + Unpin>(
    reader: &mut R,
    tracker: &Tracker,
    mut stop_rx: oneshot::Receiver<()>,
) -> io::Result<u64> {
    let mut frame = [0u8; AZ_ALT_PAYLOAD_LEN];
    let mut frames = 0;

    loop {
        let read = tokio::select! {
            read = reader.read_exact(&mut frame) => read,
            _ = &mut stop_rx => return Ok(frames),
        };
        match read {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                log::info!("Sample stream closed");
                return Ok(frames);
            }
            Err(e) => return Err(e),
        }
        frames += 1;

        match tracker.submit(frame.to_vec()).await {
            Ok(_) => {}
            Err(TrackerError::NotRunning) => return Ok(frames),
            Err(e) => log::warn!("Frame {} rejected: {}", frames, e),
        }
    }
}
