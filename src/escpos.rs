//! Minimal ESC/POS binary command builder for thermal receipt printers.
//!
//! Used to print the shift stock sheet on the counter printer. Supports text
//! formatting, alignment, Portuguese character encoding (CP860) and paper
//! cutting.

// ESC/POS command bytes
const ESC: u8 = 0x1B;
const GS: u8 = 0x1D;
const LF: u8 = 0x0A;

/// ESC t code page number for PC860 (Portuguese).
const CODE_PAGE_PC860: u8 = 3;

/// Paper width in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaperWidth {
    Mm58,
    Mm80,
}

impl PaperWidth {
    pub fn chars(self) -> usize {
        match self {
            PaperWidth::Mm58 => 32,
            PaperWidth::Mm80 => 48,
        }
    }

    pub fn from_mm(mm: i32) -> Self {
        if mm <= 58 {
            PaperWidth::Mm58
        } else {
            PaperWidth::Mm80
        }
    }
}

/// Builder for generating ESC/POS binary command buffers.
///
/// ```rust,ignore
/// let mut builder = EscPosBuilder::new().with_paper(PaperWidth::Mm58);
/// builder.init().portuguese_mode().center().bold(true);
/// builder.text("STOCK REPORT").lf().bold(false).left().separator();
/// builder.feed(3).cut();
/// let data = builder.build();
/// ```
pub struct EscPosBuilder {
    buffer: Vec<u8>,
    paper: PaperWidth,
    portuguese: bool,
}

impl Default for EscPosBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EscPosBuilder {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(1024),
            paper: PaperWidth::Mm80,
            portuguese: false,
        }
    }

    pub fn with_paper(mut self, paper: PaperWidth) -> Self {
        self.paper = paper;
        self
    }

    // -----------------------------------------------------------------------
    // Initialization
    // -----------------------------------------------------------------------

    /// ESC @: Initialize printer, reset to defaults.
    pub fn init(&mut self) -> &mut Self {
        self.buffer.extend_from_slice(&[ESC, 0x40]);
        self
    }

    /// ESC t n: Select character code page.
    pub fn code_page(&mut self, page: u8) -> &mut Self {
        self.buffer.extend_from_slice(&[ESC, 0x74, page]);
        self
    }

    /// Select PC860 and encode accented Latin text for it.
    pub fn portuguese_mode(&mut self) -> &mut Self {
        self.code_page(CODE_PAGE_PC860);
        self.portuguese = true;
        self
    }

    // -----------------------------------------------------------------------
    // Text formatting
    // -----------------------------------------------------------------------

    /// ESC E n: Bold on/off.
    pub fn bold(&mut self, on: bool) -> &mut Self {
        self.buffer
            .extend_from_slice(&[ESC, 0x45, if on { 1 } else { 0 }]);
        self
    }

    /// GS ! n: Set text size (width × height multiplier, 1–8 each).
    pub fn text_size(&mut self, width: u8, height: u8) -> &mut Self {
        let w = width.clamp(1, 8) - 1;
        let h = height.clamp(1, 8) - 1;
        self.buffer.extend_from_slice(&[GS, 0x21, (w << 4) | h]);
        self
    }

    pub fn normal_size(&mut self) -> &mut Self {
        self.text_size(1, 1)
    }

    pub fn double_height(&mut self) -> &mut Self {
        self.text_size(1, 2)
    }

    // -----------------------------------------------------------------------
    // Alignment
    // -----------------------------------------------------------------------

    /// ESC a 0: Left-align.
    pub fn left(&mut self) -> &mut Self {
        self.buffer.extend_from_slice(&[ESC, 0x61, 0]);
        self
    }

    /// ESC a 1: Centre-align.
    pub fn center(&mut self) -> &mut Self {
        self.buffer.extend_from_slice(&[ESC, 0x61, 1]);
        self
    }

    // -----------------------------------------------------------------------
    // Text output
    // -----------------------------------------------------------------------

    /// Append text. Characters are encoded as ASCII or CP860 (Portuguese mode).
    pub fn text(&mut self, s: &str) -> &mut Self {
        if self.portuguese {
            self.buffer.extend(encode_cp860(s));
        } else {
            // ASCII fallback: pass through bytes < 0x80, replace rest with '?'
            for ch in s.chars() {
                let code = ch as u32;
                if code < 0x80 {
                    self.buffer.push(code as u8);
                } else {
                    self.buffer.push(b'?');
                }
            }
        }
        self
    }

    pub fn lf(&mut self) -> &mut Self {
        self.buffer.push(LF);
        self
    }

    /// Text followed by a line-feed.
    pub fn line(&mut self, s: &str) -> &mut Self {
        self.text(s).lf()
    }

    /// Print a horizontal separator using dashes, matching paper width.
    pub fn separator(&mut self) -> &mut Self {
        let width = self.paper.chars();
        self.buffer.extend(std::iter::repeat(b'-').take(width));
        self.buffer.push(LF);
        self
    }

    // -----------------------------------------------------------------------
    // Feed / cut
    // -----------------------------------------------------------------------

    /// ESC d n: Feed n lines.
    pub fn feed(&mut self, lines: u8) -> &mut Self {
        self.buffer.extend_from_slice(&[ESC, 0x64, lines]);
        self
    }

    /// GS V A 16: Partial cut with 16-dot feed.
    pub fn cut(&mut self) -> &mut Self {
        self.buffer.extend_from_slice(&[GS, 0x56, 0x41, 0x10]);
        self
    }

    /// Consume the builder and return the binary ESC/POS payload.
    pub fn build(self) -> Vec<u8> {
        self.buffer
    }
}

// ---------------------------------------------------------------------------
// CP860 Portuguese character encoding
// ---------------------------------------------------------------------------

/// Encode a string to CP860 bytes. ASCII passes through; accented Latin
/// letters used in Portuguese map to their CP860 byte. Anything else is `?`.
fn encode_cp860(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len());
    for ch in text.chars() {
        let code = ch as u32;
        if code < 0x80 {
            bytes.push(code as u8);
            continue;
        }
        bytes.push(latin_to_cp860(ch).unwrap_or(b'?'));
    }
    bytes
}

fn latin_to_cp860(ch: char) -> Option<u8> {
    match ch {
        'Ç' => Some(0x80),
        'ü' => Some(0x81),
        'é' => Some(0x82),
        'â' => Some(0x83),
        'ã' => Some(0x84),
        'à' => Some(0x85),
        'Á' => Some(0x86),
        'ç' => Some(0x87),
        'ê' => Some(0x88),
        'Ê' => Some(0x89),
        'è' => Some(0x8A),
        'Í' => Some(0x8B),
        'Ô' => Some(0x8C),
        'ì' => Some(0x8D),
        'Ã' => Some(0x8E),
        'Â' => Some(0x8F),
        'É' => Some(0x90),
        'À' => Some(0x91),
        'È' => Some(0x92),
        'ô' => Some(0x93),
        'õ' => Some(0x94),
        'ò' => Some(0x95),
        'Ú' => Some(0x96),
        'ù' => Some(0x97),
        'Ì' => Some(0x98),
        'Õ' => Some(0x99),
        'Ü' => Some(0x9A),
        'Ù' => Some(0x9D),
        'Ó' => Some(0x9F),
        'á' => Some(0xA0),
        'í' => Some(0xA1),
        'ó' => Some(0xA2),
        'ú' => Some(0xA3),
        'ñ' => Some(0xA4),
        'Ñ' => Some(0xA5),
        'ª' => Some(0xA6),
        'º' => Some(0xA7),
        'Ò' => Some(0xA9),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separator_matches_paper_width() {
        let mut builder = EscPosBuilder::new().with_paper(PaperWidth::Mm58);
        builder.separator();
        let bytes = builder.build();
        assert_eq!(bytes.len(), 33);
        assert!(bytes[..32].iter().all(|b| *b == b'-'));
        assert_eq!(bytes[32], LF);
    }

    #[test]
    fn portuguese_mode_encodes_accents() {
        let mut builder = EscPosBuilder::new();
        builder.portuguese_mode().text("Água Tônica");
        let bytes = builder.build();
        assert_eq!(&bytes[..3], &[ESC, 0x74, CODE_PAGE_PC860]);
        assert_eq!(bytes[3], 0x86);
        assert!(!bytes.contains(&b'?'));
    }

    #[test]
    fn ascii_mode_replaces_non_ascii() {
        let mut builder = EscPosBuilder::new();
        builder.text("Guaraná");
        assert_eq!(builder.build(), b"Guaran?".to_vec());
    }

    #[test]
    fn text_size_clamps_multipliers() {
        let mut builder = EscPosBuilder::new();
        builder.text_size(0, 9);
        assert_eq!(builder.build(), vec![GS, 0x21, 0x07]);
    }
}
