//! Statistics report to a C `FILE*`.

use std::ffi::c_int;
use std::io::{self, Write};

use stepctl_core::OutputFormat;
use stepctl_core::diag;

use crate::macros::abi_fn;
use crate::util::{StepctlMem, diag_err, with_handle};

/// `io::Write` over a borrowed C stream.
struct CFile(*mut libc::FILE);

impl Write for CFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // SAFETY: the stream is non-null and owned by the caller for the call.
        let n = unsafe { libc::fwrite(buf.as_ptr().cast(), 1, buf.len(), self.0) };
        if n == 0 && !buf.is_empty() {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "fwrite wrote nothing"));
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        // SAFETY: as above.
        if unsafe { libc::fflush(self.0) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

abi_fn! {
    /// Write every statistic to `outfile`; `fmt` is 0 for a table, 1 for CSV.
    fn stepctl_print_all_stats(mem: *mut StepctlMem, outfile: *mut libc::FILE, fmt: c_int) -> c_int {
        const OP: &str = "print_all_stats";
        with_handle(OP, mem, |h| {
            let fmt = OutputFormat::from_raw(fmt).inspect_err(|e| diag::report_error(OP, e))?;
            if outfile.is_null() {
                return diag_err(OP, "outfile is null");
            }
            h.print_all_stats(&mut CFile(outfile), fmt)
        })
    }
}
