use chrono::{Local, NaiveTime};
use owo_colors::{OwoColorize, Style};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

/// Formats lines of one process as `HH:MM:SS name   |line`.
#[derive(Debug, Clone)]
pub struct Tagger {
	prefix: String,
	style: Option<Style>,
}

impl Tagger {
	/// `pad` is the longest name in the Procfile; every name is right-padded
	/// to `pad + 1` columns so the `|` separators line up.
	pub fn new(name: &str, pad: usize, style: Option<Style>) -> Self {
		Self {
			prefix: format!("{:<width$}|", name, width = pad + 1),
			style,
		}
	}

	pub fn prefix(&self) -> &str {
		&self.prefix
	}

	pub fn tag(&self, line: &str) -> String {
		self.tag_at(Local::now().time(), line)
	}

	pub fn tag_at(&self, time: NaiveTime, line: &str) -> String {
		let head = format!("{} {}", time.format("%H:%M:%S"), self.prefix);
		match self.style {
			Some(style) => format!("{}{}", head.style(style), line),
			None => format!("{}{}", head, line),
		}
	}
}

/// Copies `reader` to `out` line by line, tagging each one.
///
/// Output that is not valid UTF-8 is replaced lossily. A trailing line with
/// no newline is still written. Returns the number of lines written.
pub async fn pump_lines<R, W>(reader: R, tagger: &Tagger, out: &mut W) -> std::io::Result<usize>
where
	R: AsyncRead + Unpin,
	W: AsyncWrite + Unpin,
{
	let mut reader = BufReader::new(reader);
	let mut buf = Vec::with_capacity(256);
	let mut lines = 0;

	loop {
		buf.clear();
		if reader.read_until(b'\n', &mut buf).await? == 0 {
			break;
		}

		let raw = strip_line_ending(&buf);
		let mut tagged = tagger.tag(&String::from_utf8_lossy(raw));
		tagged.push('\n');

		// one write per line keeps lines from different processes whole
		out.write_all(tagged.as_bytes()).await?;
		out.flush().await?;
		lines += 1;
	}

	Ok(lines)
}

fn strip_line_ending(buf: &[u8]) -> &[u8] {
	let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
	buf.strip_suffix(b"\r").unwrap_or(buf)
}
