//! Lightweight rich-text formatting for message bodies.
//!
//! Raw text goes through an ordered pipeline of passes: bold, italic, inline
//! code, then currency amounts. Each pass scans the visible text left by the
//! earlier ones, so markers inside a bold run are still consumed and the
//! markup nests (`**a *b* c**` is bold with an italic word). Removed markers
//! are never re-scanned, and currency is not highlighted inside code. Source
//! text is carried as data inside spans and is escaped when rendered, so the
//! span marks are the only structure the formatter can ever emit.

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

/// Messages longer than this many characters are shown collapsed.
pub const LONG_MESSAGE_CHARS: usize = 200;

const CURRENCY_SYMBOL: char = '₾';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Plain,
    Strong,
    Emphasis,
    Code,
    /// Currency symbol plus amount, shown bold and colored.
    Currency,
}

/// The set of kinds applied to a span. Empty means plain text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Marks(u8);

impl Marks {
    pub const PLAIN: Self = Self(0);

    /// Nesting order, outermost first.
    pub const ORDER: [SpanKind; 4] = [
        SpanKind::Strong,
        SpanKind::Emphasis,
        SpanKind::Code,
        SpanKind::Currency,
    ];

    const fn bit(kind: SpanKind) -> u8 {
        match kind {
            SpanKind::Plain => 0,
            SpanKind::Strong => 1,
            SpanKind::Emphasis => 1 << 1,
            SpanKind::Code => 1 << 2,
            SpanKind::Currency => 1 << 3,
        }
    }

    #[must_use]
    pub const fn with(self, kind: SpanKind) -> Self {
        Self(self.0 | Self::bit(kind))
    }

    #[must_use]
    pub const fn contains(self, kind: SpanKind) -> bool {
        match kind {
            SpanKind::Plain => self.0 == 0,
            _ => self.0 & Self::bit(kind) != 0,
        }
    }

    #[must_use]
    pub const fn is_plain(self) -> bool {
        self.0 == 0
    }

    /// Applied kinds, outermost first.
    #[must_use]
    pub fn kinds(self) -> impl Iterator<Item = SpanKind> {
        Self::ORDER.into_iter().filter(move |&kind| self.contains(kind))
    }
}

impl FromIterator<SpanKind> for Marks {
    fn from_iter<I: IntoIterator<Item = SpanKind>>(iter: I) -> Self {
        iter.into_iter().fold(Self::PLAIN, Self::with)
    }
}

/// A run of text sharing the same marks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub marks: Marks,
    pub text: String,
}

impl Span {
    #[must_use]
    pub const fn has(&self, kind: SpanKind) -> bool {
        self.marks.contains(kind)
    }
}

/// Output of [`format`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredText {
    spans: Vec<Span>,
}

impl StructuredText {
    #[must_use]
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    #[must_use]
    pub fn into_spans(self) -> Vec<Span> {
        self.spans
    }

    /// True when no pass matched anything.
    #[must_use]
    pub fn is_plain(&self) -> bool {
        self.spans.iter().all(|s| s.marks.is_plain())
    }

    /// The text a reader sees, with markers removed.
    #[must_use]
    pub fn plain(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// Render as an HTML fragment with properly nested tags. All source text
    /// is escaped.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        let mut open: Vec<SpanKind> = Vec::new();
        for span in &self.spans {
            // Keep the outer tags this span still needs, close the rest.
            let kept = open
                .iter()
                .take_while(|&&kind| span.marks.contains(kind))
                .count();
            for kind in open.drain(kept..).rev() {
                html.push_str(close_tag(kind));
            }
            for kind in span.marks.kinds() {
                if !open.contains(&kind) {
                    html.push_str(open_tag(kind));
                    open.push(kind);
                }
            }
            html.push_str(&escape_html(&span.text));
        }
        for kind in open.into_iter().rev() {
            html.push_str(close_tag(kind));
        }
        html
    }
}

const fn open_tag(kind: SpanKind) -> &'static str {
    match kind {
        SpanKind::Plain => "",
        SpanKind::Strong => "<strong>",
        SpanKind::Emphasis => "<em>",
        SpanKind::Code => "<code>",
        SpanKind::Currency => "<span style=\"font-weight: bold; color: #2e7d32;\">",
    }
}

const fn close_tag(kind: SpanKind) -> &'static str {
    match kind {
        SpanKind::Plain => "",
        SpanKind::Strong => "</strong>",
        SpanKind::Emphasis => "</em>",
        SpanKind::Code => "</code>",
        SpanKind::Currency => "</span>",
    }
}

static BOLD: OnceLock<Regex> = OnceLock::new();
static ITALIC: OnceLock<Regex> = OnceLock::new();
static CODE: OnceLock<Regex> = OnceLock::new();
static CURRENCY: OnceLock<Regex> = OnceLock::new();

#[expect(
    clippy::expect_used,
    reason = "Static regex patterns validated at compile time"
)]
fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("Static regex pattern is guaranteed to be valid"))
}

fn bold_pattern() -> &'static Regex {
    compiled(&BOLD, r"\*\*(.+?)\*\*")
}

fn italic_pattern() -> &'static Regex {
    compiled(&ITALIC, r"\*([^*\n]+)\*")
}

fn code_pattern() -> &'static Regex {
    compiled(&CODE, r"`([^`\n]+)`")
}

fn currency_pattern() -> &'static Regex {
    compiled(&CURRENCY, r"₾\d+(?:,\d{3})*(?:\.\d{2})?")
}

/// One visible character and the marks applied to it so far.
#[derive(Debug, Clone, Copy)]
struct Cell {
    ch: char,
    marks: Marks,
}

/// Split raw message text into formatted spans.
///
/// Total for every input: unbalanced or empty markers are left as literal
/// text.
#[must_use]
pub fn format(text: &str) -> StructuredText {
    let mut cells: Vec<Cell> = text
        .chars()
        .map(|ch| Cell {
            ch,
            marks: Marks::PLAIN,
        })
        .collect();
    mark_delimited(&mut cells, bold_pattern(), SpanKind::Strong);
    mark_delimited(&mut cells, italic_pattern(), SpanKind::Emphasis);
    mark_delimited(&mut cells, code_pattern(), SpanKind::Code);
    mark_currency(&mut cells);
    StructuredText {
        spans: group(&cells),
    }
}

/// Shorten `text` to at most `limit` characters, ending in `...` when cut.
#[must_use]
pub fn preview(text: &str, limit: usize) -> Cow<'_, str> {
    match text.char_indices().nth(limit) {
        None => Cow::Borrowed(text),
        Some((cut, _)) => Cow::Owned(format!("{}...", text[..cut].trim_end())),
    }
}

#[must_use]
pub fn is_long(text: &str) -> bool {
    text.chars().nth(LONG_MESSAGE_CHARS).is_some()
}

/// Visible text of `cells` plus the byte offset where each cell starts, with
/// the total length as a final entry.
fn visible(cells: &[Cell]) -> (String, Vec<usize>) {
    let mut text = String::with_capacity(cells.len());
    let mut offsets = Vec::with_capacity(cells.len() + 1);
    for cell in cells {
        offsets.push(text.len());
        text.push(cell.ch);
    }
    offsets.push(text.len());
    (text, offsets)
}

fn cell_at(offsets: &[usize], byte: usize) -> usize {
    offsets.partition_point(|&o| o < byte)
}

/// Mark the inner group of every match with `kind` and drop the delimiters.
fn mark_delimited(cells: &mut Vec<Cell>, pattern: &Regex, kind: SpanKind) {
    let (text, offsets) = visible(cells);
    let mut delimiter = vec![false; cells.len()];
    for caps in pattern.captures_iter(&text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let start = cell_at(&offsets, inner.start());
        let end = cell_at(&offsets, inner.end());
        for cell in &mut cells[start..end] {
            cell.marks = cell.marks.with(kind);
        }
        delimiter[cell_at(&offsets, whole.start())..start].fill(true);
        delimiter[end..cell_at(&offsets, whole.end())].fill(true);
    }
    let mut dropped = delimiter.into_iter();
    cells.retain(|_| !dropped.next().unwrap_or(false));
}

fn mark_currency(cells: &mut [Cell]) {
    let (text, offsets) = visible(cells);
    if !text.contains(CURRENCY_SYMBOL) {
        return;
    }
    for found in currency_pattern().find_iter(&text) {
        if continues_numeral(&text[found.end()..]) {
            continue;
        }
        let start = cell_at(&offsets, found.start());
        let amount = &mut cells[start..cell_at(&offsets, found.end())];
        if amount.iter().any(|c| c.marks.contains(SpanKind::Code)) {
            continue;
        }
        for cell in amount {
            cell.marks = cell.marks.with(SpanKind::Currency);
        }
    }
}

fn group(cells: &[Cell]) -> Vec<Span> {
    let mut spans: Vec<Span> = Vec::new();
    for cell in cells {
        match spans.last_mut() {
            Some(last) if last.marks == cell.marks => last.text.push(cell.ch),
            _ => spans.push(Span {
                marks: cell.marks,
                text: cell.ch.to_string(),
            }),
        }
    }
    spans
}

/// Whether the text right after a currency candidate extends the numeral in
/// a way the strict pattern does not allow (`₾12.5`, `₾1,23`, `₾1,2345`).
fn continues_numeral(rest: &str) -> bool {
    let mut chars = rest.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('.' | ',') => chars.next().is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    }
}

fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::SpanKind::{Code, Currency, Emphasis, Strong};

    fn kinds(text: &str) -> Vec<(Marks, String)> {
        format(text)
            .into_spans()
            .into_iter()
            .map(|s| (s.marks, s.text))
            .collect()
    }

    fn span(kinds: &[SpanKind], text: &str) -> (Marks, String) {
        (kinds.iter().copied().collect(), text.to_string())
    }

    #[test]
    fn test_plain_text_passes_through() {
        let out = format("Your card ending 4417 is active.");
        assert!(out.is_plain());
        assert_eq!(out.plain(), "Your card ending 4417 is active.");
    }

    #[test]
    fn test_empty_input_has_no_spans() {
        assert!(format("").spans().is_empty());
    }

    #[test]
    fn test_markup_passes_produce_typed_spans() {
        assert_eq!(
            kinds("**Blocked** card, *temporary*, ref `TX-19`"),
            vec![
                span(&[Strong], "Blocked"),
                span(&[], " card, "),
                span(&[Emphasis], "temporary"),
                span(&[], ", ref "),
                span(&[Code], "TX-19"),
            ]
        );
    }

    #[test]
    fn test_markers_inside_bold_are_consumed() {
        assert_eq!(
            kinds("**a *b* c**"),
            vec![
                span(&[Strong], "a "),
                span(&[Strong, Emphasis], "b"),
                span(&[Strong], " c"),
            ]
        );
        assert_eq!(
            kinds("**ref `TX-19`**"),
            vec![span(&[Strong], "ref "), span(&[Strong, Code], "TX-19")]
        );
        assert_eq!(
            kinds("**limit ₾500**"),
            vec![span(&[Strong], "limit "), span(&[Strong, Currency], "₾500")]
        );
        assert_eq!(kinds("`**x**`"), vec![span(&[Strong, Code], "x")]);
    }

    #[test]
    fn test_nested_markup_renders_nested_html() {
        assert_eq!(
            format("**a *b* c**").to_html(),
            "<strong>a <em>b</em> c</strong>"
        );
        assert_eq!(
            format("*pay **₾5** now*").to_html(),
            "<em>pay <strong><span style=\"font-weight: bold; color: #2e7d32;\">₾5</span></strong> now</em>"
        );
    }

    #[test]
    fn test_currency_is_not_highlighted_inside_code() {
        assert_eq!(kinds("`₾10.00`"), vec![span(&[Code], "₾10.00")]);
        assert_eq!(
            kinds("**`₾10.00`**"),
            vec![span(&[Strong, Code], "₾10.00")]
        );
    }

    #[test]
    fn test_currency_with_separators_and_decimals_is_highlighted() {
        assert_eq!(
            kinds("Limit: ₾1,234.56 today"),
            vec![
                span(&[], "Limit: "),
                span(&[Currency], "₾1,234.56"),
                span(&[], " today"),
            ]
        );
    }

    #[test]
    fn test_currency_without_decimals_is_highlighted() {
        assert_eq!(kinds("₾12"), vec![span(&[Currency], "₾12")]);
        assert_eq!(
            kinds("Pay ₾12."),
            vec![
                span(&[], "Pay "),
                span(&[Currency], "₾12"),
                span(&[], "."),
            ]
        );
    }

    #[test]
    fn test_currency_with_one_decimal_stays_plain() {
        assert_eq!(kinds("₾12.5"), vec![span(&[], "₾12.5")]);
        assert_eq!(kinds("₾1,23"), vec![span(&[], "₾1,23")]);
        assert_eq!(kinds("₾1,234.567"), vec![span(&[], "₾1,234.567")]);
    }

    #[test]
    fn test_several_amounts_in_one_message() {
        let out = format("from ₾500 to ₾1,500.00, not ₾7.5");
        let amounts: Vec<_> = out
            .spans()
            .iter()
            .filter(|s| s.has(Currency))
            .map(|s| s.text.as_str())
            .collect();
        assert_eq!(amounts, ["₾500", "₾1,500.00"]);
        assert_eq!(out.plain(), "from ₾500 to ₾1,500.00, not ₾7.5");
    }

    #[test]
    fn test_unbalanced_markers_are_literal() {
        for text in ["**open", "*", "`", "a ** b", "****", "``", "*\n*", "₾", "**\n**"] {
            let out = format(text);
            assert!(out.is_plain(), "{text:?} should stay plain");
            assert_eq!(out.plain(), text);
        }
    }

    #[test]
    fn test_unicode_text_is_preserved() {
        assert_eq!(
            kinds("გამარჯობა **მეგობარო *ძვირფასო***"),
            vec![
                span(&[], "გამარჯობა "),
                span(&[Strong], "მეგობარო "),
                span(&[Strong, Emphasis], "ძვირფასო"),
            ]
        );
    }

    #[test]
    fn test_reformatting_visible_text_is_stable() {
        for text in [
            "Your **new** limit is ₾1,000.00",
            "*Note*: use `PIN` at the ATM",
            "unbalanced **oops",
            "₾12.5 is not an amount",
            "nothing to see",
            "**a *b* c**",
            "**card `4821` is *blocked***",
            "*pay **₾5** now*",
            "`**x**` and **`y`**",
        ] {
            let visible = format(text).plain();
            assert_eq!(format(&visible).plain(), visible, "for {text:?}");
        }
    }

    #[test]
    fn test_html_escapes_source_markup() {
        let html = format("<script>alert('x')</script> **<b>&**").to_html();
        assert_eq!(
            html,
            "&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; <strong>&lt;b&gt;&amp;</strong>"
        );
    }

    #[test]
    fn test_html_currency_span_is_styled() {
        assert_eq!(
            format("₾5").to_html(),
            "<span style=\"font-weight: bold; color: #2e7d32;\">₾5</span>"
        );
    }

    #[test]
    fn test_preview_cuts_on_char_boundary() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("ბანკი ბარათი", 5), "ბანკი...");
        assert_eq!(preview("abc def", 4), "abc...");
    }

    #[test]
    fn test_long_message_threshold() {
        assert!(!is_long(&"x".repeat(LONG_MESSAGE_CHARS)));
        assert!(is_long(&"x".repeat(LONG_MESSAGE_CHARS + 1)));
    }
}
