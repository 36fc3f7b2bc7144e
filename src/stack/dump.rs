//! Human-readable stack reports

use std::fmt::Write as _;
use std::io;

use super::Stack;
use crate::hash::format_digest;
use crate::types::Element;

impl<T: Element> Stack<T> {
    /// Render a full report: identity, status, sizes, digests and every slot
    ///
    /// `caller` names the operation the report was requested from.
    /// Live slots are marked with `*`, sentinel slots print as `POISON`.
    pub fn dump(&self, caller: &str) -> String {
        let mut out = String::new();

        let status = match self.self_check() {
            Ok(()) => "ok".to_string(),
            Err(err) => err.to_string(),
        };

        let _ = writeln!(
            out,
            "Stack<{}> \"{}\" [{}] ({})",
            T::TYPE_NAME,
            self.name,
            self.id,
            status
        );
        let _ = writeln!(out, "    called from: {}", caller);
        let _ = writeln!(out, "    lifecycle = {}", self.lifecycle.label());
        let _ = writeln!(out, "    capacity  = {}", self.slots.len());
        let _ = writeln!(out, "    size      = {}", self.size);

        if let Some(algo) = &self.config.integrity {
            let _ = writeln!(out, "    digest    = {}", algo.name());
            if let Some(digests) = self.digests {
                let _ = writeln!(out, "    control   = {}", format_digest(digests.control));
                let _ = writeln!(out, "    data      = {}", format_digest(digests.data));
            }
        }

        if self.slots.is_empty() {
            let _ = writeln!(out, "    data: <none>");
            return out;
        }

        let width = (self.slots.len() - 1).to_string().len();
        let _ = writeln!(out, "    {{");
        for (idx, slot) in self.slots.iter().enumerate() {
            let mark = if idx < self.size { '*' } else { ' ' };
            match slot {
                Some(value) => {
                    let _ = writeln!(out, "       {}[{:>w$}] = {:?}", mark, idx, value, w = width);
                }
                None => {
                    let _ = writeln!(out, "       {}[{:>w$}] = POISON", mark, idx, w = width);
                }
            }
        }
        let _ = writeln!(out, "    }}");

        out
    }

    /// Write [`Stack::dump`] to any writer (a log file, stdout, a buffer)
    pub fn dump_to<W: io::Write>(&self, caller: &str, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.dump(caller).as_bytes())?;
        writer.flush()
    }
}
