//! Progress reporting for file downloads.

/// Bytes read between two progress callbacks.
pub const PROGRESS_INTERVAL: u64 = 64 * 1024;

/// A snapshot of a running download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Bytes received so far.
    pub bytes_read: u64,

    /// The `Content-Length` of the response, if the server sent one.
    pub content_length: Option<u64>,

    /// `bytes_read * 100 / content_length`, or 0 when the length is unknown.
    pub percent: u8,
}

impl DownloadProgress {
    fn new(bytes_read: u64, content_length: Option<u64>) -> Self {
        let percent = match content_length {
            Some(total) if total > 0 => (bytes_read.saturating_mul(100) / total).min(100) as u8,
            _ => 0,
        };
        Self {
            bytes_read,
            content_length,
            percent,
        }
    }
}

/// Batches chunk notifications into at most one callback per
/// [`PROGRESS_INTERVAL`] bytes, plus a final one.
pub(crate) struct ProgressReporter<F> {
    callback: F,
    content_length: Option<u64>,
    bytes_read: u64,
    last_reported: Option<u64>,
}

impl<F> ProgressReporter<F>
where
    F: FnMut(DownloadProgress),
{
    pub fn new(content_length: Option<u64>, callback: F) -> Self {
        Self {
            callback,
            content_length,
            bytes_read: 0,
            last_reported: None,
        }
    }

    pub fn advance(&mut self, chunk_len: usize) {
        self.bytes_read += chunk_len as u64;
        let since_last = self.bytes_read - self.last_reported.unwrap_or(0);
        if since_last >= PROGRESS_INTERVAL {
            self.report();
        }
    }

    /// Emits the final report unless the last one already covered every byte.
    pub fn finish(mut self) -> u64 {
        if self.last_reported != Some(self.bytes_read) {
            self.report();
        }
        self.bytes_read
    }

    fn report(&mut self) {
        self.last_reported = Some(self.bytes_read);
        (self.callback)(DownloadProgress::new(self.bytes_read, self.content_length));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(content_length: Option<u64>, chunks: &[usize]) -> Vec<DownloadProgress> {
        let mut reports = Vec::new();
        let mut reporter = ProgressReporter::new(content_length, |p| reports.push(p));
        for chunk in chunks {
            reporter.advance(*chunk);
        }
        reporter.finish();
        reports
    }

    #[test]
    fn test_small_chunks_are_batched() {
        // 200 chunks of 1 KiB: three interval reports and a final one.
        let reports = collect(Some(200 * 1024), &[1024; 200]);

        assert_eq!(reports.len(), 4);
        assert_eq!(reports[0].bytes_read, 64 * 1024);
        assert_eq!(reports[0].percent, 32);
        assert_eq!(reports[3].bytes_read, 200 * 1024);
        assert_eq!(reports[3].percent, 100);
    }

    #[test]
    fn test_unknown_length_reports_zero_percent() {
        let reports = collect(None, &[100_000]);

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].bytes_read, 100_000);
        assert_eq!(reports[0].percent, 0);
    }

    #[test]
    fn test_no_duplicate_final_report() {
        let reports = collect(Some(PROGRESS_INTERVAL), &[PROGRESS_INTERVAL as usize]);
        assert_eq!(reports.len(), 1);
    }

    #[test]
    fn test_empty_body_still_reports_once() {
        let reports = collect(Some(0), &[]);
        assert_eq!(
            reports,
            vec![DownloadProgress {
                bytes_read: 0,
                content_length: Some(0),
                percent: 0
            }]
        );
    }
}
