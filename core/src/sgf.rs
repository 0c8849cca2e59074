//! Snapshot text encoding, an SGF (FF[4]) game record with a few private
//! properties.
//!
//! Layout written by `serialize`:
//!
//! ```text
//! (;FF[4]GM[1]CA[UTF-8]AP[goban:0.1.0]XF[1]SZ[19]KM[6.5]RU[simple-ko]HA[0]
//! PB[Black]PW[White]DT[2026-10-17]XI[<uuid>]XV[2]
//! ;B[pd]
//! ;W[dp]
//! ;B[])
//! ```
//!
//! Private properties:
//!   - `XF` snapshot format version
//!   - `XV` last-viewed position (0 = empty board)
//!   - `XI` game id
//!
//! RULE: `deserialize` is the only place a corrupt backup is detected.
//! Anything it accepts must be decodable into moves and a position that
//! are at least syntactically valid.

use crate::{
    config::KoRule,
    error::MalformedSnapshotError,
    game::GameAggregate,
    snapshot::{resignation_winner, DecodedSnapshot, RulesSummary, SNAPSHOT_FORMAT_VERSION},
    types::{Color, Move, Vertex},
};
use chrono::NaiveDate;
use std::fmt::Write as _;
use uuid::Uuid;

/// Largest board SGF point letters can express.
const MAX_SGF_SIZE: u8 = 25;

type Property = (String, Vec<String>);
type Node = Vec<Property>;

// ── Encoding ───────────────────────────────────────────────────

/// Encode a game and the position the user is viewing.
/// Identical input always yields identical bytes.
pub fn serialize(game: &GameAggregate, last_viewed: usize) -> Vec<u8> {
    let size = game.board_size().get();
    let rules = game.rules();
    let info = game.info();
    let mut out = String::new();

    writeln!(
        out,
        "(;FF[4]GM[1]CA[UTF-8]AP[goban:{}]XF[{}]SZ[{}]KM[{}]RU[{}]HA[{}]",
        env!("CARGO_PKG_VERSION"),
        SNAPSHOT_FORMAT_VERSION,
        size,
        rules.komi,
        rules.ko_rule.as_str(),
        game.handicap().len(),
    )
    .ok();
    write!(
        out,
        "PB[{}]PW[{}]DT[{}]XI[{}]XV[{}]",
        escape(&rules.black_player),
        escape(&rules.white_player),
        info.started.format("%Y-%m-%d"),
        info.id,
        last_viewed,
    )
    .ok();
    if !game.handicap().is_empty() {
        out.push_str("AB");
        for &vertex in game.handicap() {
            write!(out, "[{}]", encode_point(vertex, size)).ok();
        }
    }
    if let Some(winner) = resignation_winner(game.status()) {
        write!(out, "RE[{}+R]", winner.tag()).ok();
    }
    for mv in game.moves() {
        match mv {
            Move::Play { color, vertex } => {
                write!(out, "\n;{}[{}]", color.tag(), encode_point(*vertex, size)).ok();
            }
            Move::Pass { color } => {
                write!(out, "\n;{}[]", color.tag()).ok();
            }
        }
    }
    out.push_str(")\n");
    out.into_bytes()
}

fn encode_point(vertex: Vertex, size: u8) -> String {
    let column = (b'a' + vertex.x) as char;
    let row = (b'a' + (size - 1 - vertex.y)) as char;
    format!("{column}{row}")
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if c == ']' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// ── Decoding ───────────────────────────────────────────────────

pub fn deserialize(bytes: &[u8]) -> Result<DecodedSnapshot, MalformedSnapshotError> {
    let text = std::str::from_utf8(bytes).map_err(|_| MalformedSnapshotError::NotUtf8)?;
    let nodes = Parser::new(text).game_tree()?;
    let (root, move_nodes) = nodes.split_first().ok_or(MalformedSnapshotError::Truncated)?;

    let version: u32 = parse_number(required(root, "XF")?, "XF")?;
    if version != SNAPSHOT_FORMAT_VERSION {
        return Err(MalformedSnapshotError::UnsupportedVersion { version });
    }

    reject_properties(root, &["B", "W", "AW", "AE"])?;

    let size: u8 = parse_number(required(root, "SZ")?, "SZ")?;
    if size == 0 || size > MAX_SGF_SIZE {
        return Err(invalid("SZ", &size.to_string()));
    }

    let handicap = match values(root, "AB") {
        Some(points) => points
            .iter()
            .map(|p| decode_point(p, size, "AB")?.ok_or_else(|| invalid("AB", p)))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    let recorded_handicap = single(root, "HA")?
        .map(|v| parse_number::<u8>(v, "HA"))
        .transpose()?;
    if let Some(count) = recorded_handicap {
        // HA[1] is a move-first handicap and places no stones.
        let placed = if count == 1 { 0 } else { count as usize };
        if placed != handicap.len() {
            return Err(invalid("HA", &count.to_string()));
        }
    }

    let moves = move_nodes
        .iter()
        .map(|node| decode_move(node, size))
        .collect::<Result<Vec<_>, _>>()?;

    let last_viewed: usize = parse_number(required(root, "XV")?, "XV")?;
    if last_viewed > moves.len() {
        return Err(MalformedSnapshotError::PositionOutOfRange {
            position: last_viewed,
            moves:    moves.len(),
        });
    }

    let rules = RulesSummary {
        board_size:   size,
        komi:         single(root, "KM")?.map(parse_komi).transpose()?,
        ko_rule:      single(root, "RU")?
            .map(|v| KoRule::from_str(v).ok_or_else(|| invalid("RU", v)))
            .transpose()?,
        handicap:     recorded_handicap.unwrap_or(handicap.len() as u8),
        black_player: single(root, "PB")?.map(str::to_string),
        white_player: single(root, "PW")?.map(str::to_string),
    };

    Ok(DecodedSnapshot {
        rules,
        handicap,
        moves,
        last_viewed,
        game_id: single(root, "XI")?
            .map(|v| Uuid::parse_str(v).map_err(|_| invalid("XI", v)))
            .transpose()?,
        started: single(root, "DT")?
            .map(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").map_err(|_| invalid("DT", v)))
            .transpose()?,
        resigned_winner: single(root, "RE")?.map(parse_result).transpose()?,
    })
}

fn decode_move(node: &Node, size: u8) -> Result<Move, MalformedSnapshotError> {
    reject_properties(node, &["AB", "AW", "AE"])?;
    if values(node, "B").is_some() && values(node, "W").is_some() {
        return Err(MalformedSnapshotError::UnexpectedProperty { property: "W".into() });
    }
    let (color, property) = if let Some(value) = single(node, "B")? {
        (Color::Black, value)
    } else if let Some(value) = single(node, "W")? {
        (Color::White, value)
    } else {
        return Err(MalformedSnapshotError::MissingProperty { property: "B/W" });
    };
    let tag = color.tag().to_string();
    Ok(match decode_point(property, size, &tag)? {
        Some(vertex) => Move::Play { color, vertex },
        None => Move::Pass { color },
    })
}

/// `None` is a pass: an empty value, or `tt` on boards up to 19x19.
fn decode_point(value: &str, size: u8, property: &str) -> Result<Option<Vertex>, MalformedSnapshotError> {
    if value.is_empty() || (value == "tt" && size <= 19) {
        return Ok(None);
    }
    let bytes = value.as_bytes();
    if bytes.len() != 2 {
        return Err(invalid(property, value));
    }
    let index = |b: u8| {
        b.is_ascii_lowercase()
            .then(|| b - b'a')
            .filter(|&i| i < size)
    };
    match (index(bytes[0]), index(bytes[1])) {
        (Some(x), Some(row)) => Ok(Some(Vertex::new(x, size - 1 - row))),
        _ => Err(invalid(property, value)),
    }
}

fn parse_komi(value: &str) -> Result<f64, MalformedSnapshotError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|k| k.is_finite())
        .ok_or_else(|| invalid("KM", value))
}

fn parse_result(value: &str) -> Result<Color, MalformedSnapshotError> {
    match value {
        "B+R" | "B+Resign" => Ok(Color::Black),
        "W+R" | "W+Resign" => Ok(Color::White),
        _ => Err(invalid("RE", value)),
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, property: &str) -> Result<T, MalformedSnapshotError> {
    value.trim().parse().map_err(|_| invalid(property, value))
}

fn values<'n>(node: &'n Node, name: &str) -> Option<&'n [String]> {
    node.iter()
        .find(|(ident, _)| ident == name)
        .map(|(_, values)| values.as_slice())
}

/// A property that must carry exactly one value, if present at all.
fn single<'n>(node: &'n Node, name: &str) -> Result<Option<&'n str>, MalformedSnapshotError> {
    match values(node, name) {
        None => Ok(None),
        Some([value]) => Ok(Some(value.as_str())),
        Some(many) => Err(invalid(name, &many.join("]["))),
    }
}

fn reject_properties(node: &Node, names: &[&str]) -> Result<(), MalformedSnapshotError> {
    match node.iter().find(|(ident, _)| names.contains(&ident.as_str())) {
        Some((ident, _)) => Err(MalformedSnapshotError::UnexpectedProperty { property: ident.clone() }),
        None => Ok(()),
    }
}

fn required<'n>(node: &'n Node, name: &'static str) -> Result<&'n str, MalformedSnapshotError> {
    single(node, name)?.ok_or(MalformedSnapshotError::MissingProperty { property: name })
}

fn invalid(property: &str, value: &str) -> MalformedSnapshotError {
    MalformedSnapshotError::InvalidValue {
        property: property.to_string(),
        value:    value.to_string(),
    }
}

/// Recursive-descent reader for a single SGF game tree without variations.
struct Parser<'a> {
    text: &'a str,
    pos:  usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn game_tree(&mut self) -> Result<Vec<Node>, MalformedSnapshotError> {
        self.skip_whitespace();
        self.expect('(')?;
        let mut nodes = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(';') => {
                    self.bump();
                    nodes.push(self.node()?);
                }
                Some(')') => {
                    self.bump();
                    break;
                }
                Some('(') => return Err(MalformedSnapshotError::Variations),
                Some(found) => return Err(self.unexpected(found)),
                None => return Err(MalformedSnapshotError::Truncated),
            }
        }
        self.skip_whitespace();
        if let Some(found) = self.peek() {
            return Err(self.unexpected(found));
        }
        if nodes.is_empty() {
            return Err(MalformedSnapshotError::Truncated);
        }
        Ok(nodes)
    }

    fn node(&mut self) -> Result<Node, MalformedSnapshotError> {
        let mut properties: Node = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(c) if c.is_ascii_uppercase() => {
                    let property = self.property()?;
                    if properties.iter().any(|(ident, _)| *ident == property.0) {
                        return Err(MalformedSnapshotError::DuplicateProperty { property: property.0 });
                    }
                    properties.push(property);
                }
                _ => return Ok(properties),
            }
        }
    }

    fn property(&mut self) -> Result<Property, MalformedSnapshotError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_uppercase()) {
            self.bump();
        }
        let ident = self.text[start..self.pos].to_string();

        let mut values = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() != Some('[') {
                break;
            }
            self.bump();
            values.push(self.value()?);
        }
        if values.is_empty() {
            return match self.peek() {
                Some(found) => Err(self.unexpected(found)),
                None => Err(MalformedSnapshotError::Truncated),
            };
        }
        Ok((ident, values))
    }

    fn value(&mut self) -> Result<String, MalformedSnapshotError> {
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(MalformedSnapshotError::Truncated),
                Some(']') => return Ok(value),
                Some('\\') => match self.bump() {
                    None => return Err(MalformedSnapshotError::Truncated),
                    // Soft line break.
                    Some('\n') => {}
                    Some(c) => value.push(c),
                },
                Some(c) => value.push(c),
            }
        }
    }

    fn expect(&mut self, wanted: char) -> Result<(), MalformedSnapshotError> {
        match self.peek() {
            Some(c) if c == wanted => {
                self.bump();
                Ok(())
            }
            Some(found) => Err(self.unexpected(found)),
            None => Err(MalformedSnapshotError::Truncated),
        }
    }

    fn unexpected(&self, found: char) -> MalformedSnapshotError {
        MalformedSnapshotError::Unexpected { offset: self.pos, found }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root(extra: &str) -> String {
        format!("(;FF[4]GM[1]XF[1]SZ[9]XV[0]{extra})")
    }

    #[test]
    fn minimal_snapshot_decodes() {
        let decoded = deserialize(root("").as_bytes()).unwrap();
        assert_eq!(decoded.rules.board_size, 9);
        assert!(decoded.moves.is_empty());
        assert_eq!(decoded.last_viewed, 0);
        assert_eq!(decoded.game_id, None);
    }

    #[test]
    fn sgf_points_count_rows_from_the_top() {
        let text = "(;XF[1]SZ[9]XV[2];B[ai];W[ia])";
        let decoded = deserialize(text.as_bytes()).unwrap();
        assert_eq!(
            decoded.moves,
            vec![
                Move::Play { color: Color::Black, vertex: "A1".parse().unwrap() },
                Move::Play { color: Color::White, vertex: "J9".parse().unwrap() },
            ]
        );
    }

    #[test]
    fn tt_and_empty_are_passes() {
        let text = "(;XF[1]SZ[19]XV[2];B[tt];W[])";
        let decoded = deserialize(text.as_bytes()).unwrap();
        assert!(decoded.moves.iter().all(Move::is_pass));
    }

    #[test]
    fn escaped_player_names_survive() {
        let decoded = deserialize(root(r"PB[a\]b\\c]").as_bytes()).unwrap();
        assert_eq!(decoded.rules.black_player.as_deref(), Some(r"a]b\c"));
        assert_eq!(escape(r"a]b\c"), r"a\]b\\c");
    }

    #[test]
    fn missing_close_paren_is_truncated() {
        let err = deserialize(b"(;XF[1]SZ[9]XV[0];B[aa]").unwrap_err();
        assert_eq!(err, MalformedSnapshotError::Truncated);
    }

    #[test]
    fn unterminated_value_is_truncated() {
        let err = deserialize(b"(;XF[1]SZ[9]XV[0];B[a").unwrap_err();
        assert_eq!(err, MalformedSnapshotError::Truncated);
    }

    #[test]
    fn variations_are_rejected() {
        let err = deserialize(b"(;XF[1]SZ[9]XV[0](;B[aa])(;B[bb]))").unwrap_err();
        assert_eq!(err, MalformedSnapshotError::Variations);
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        let err = deserialize(format!("{}x", root("")).as_bytes()).unwrap_err();
        assert!(matches!(err, MalformedSnapshotError::Unexpected { found: 'x', .. }));
    }

    #[test]
    fn point_outside_board_is_invalid() {
        let err = deserialize(b"(;XF[1]SZ[9]XV[0];B[jj])").unwrap_err();
        assert!(matches!(err, MalformedSnapshotError::InvalidValue { ref property, .. } if property == "B"));
    }

    #[test]
    fn move_node_without_colour_is_rejected() {
        let err = deserialize(b"(;XF[1]SZ[9]XV[0];C[comment])").unwrap_err();
        assert_eq!(err, MalformedSnapshotError::MissingProperty { property: "B/W" });
    }

    #[test]
    fn future_format_version_is_rejected() {
        let err = deserialize(b"(;XF[2]SZ[9]XV[0])").unwrap_err();
        assert_eq!(err, MalformedSnapshotError::UnsupportedVersion { version: 2 });
    }

    #[test]
    fn unknown_ko_rule_is_rejected() {
        let err = deserialize(root("RU[japanese]").as_bytes()).unwrap_err();
        assert!(matches!(err, MalformedSnapshotError::InvalidValue { ref property, .. } if property == "RU"));
    }

    /// A move node holds one move, never both colours.
    #[test]
    fn move_node_with_both_colours_is_rejected() {
        let err = deserialize(b"(;XF[1]SZ[9]XV[1];B[aa]W[bb])").unwrap_err();
        assert_eq!(err, MalformedSnapshotError::UnexpectedProperty { property: "W".into() });
    }

    /// Setup stones belong in the root only.
    #[test]
    fn setup_stones_in_move_node_are_rejected() {
        let err = deserialize(b"(;XF[1]SZ[9]XV[1];B[aa]AW[bb])").unwrap_err();
        assert_eq!(err, MalformedSnapshotError::UnexpectedProperty { property: "AW".into() });
    }

    /// Only black handicap stones may be set up.
    #[test]
    fn white_setup_stones_in_root_are_rejected() {
        let err = deserialize(root("AW[cc]").as_bytes()).unwrap_err();
        assert_eq!(err, MalformedSnapshotError::UnexpectedProperty { property: "AW".into() });
    }

    /// A property given twice in one node is ambiguous.
    #[test]
    fn repeated_property_is_rejected() {
        let err = deserialize(b"(;XF[1]SZ[9]SZ[19]XV[0])").unwrap_err();
        assert_eq!(err, MalformedSnapshotError::DuplicateProperty { property: "SZ".into() });
    }

    /// `HA` must agree with the number of `AB` stones; `HA[1]` places none.
    #[test]
    fn handicap_count_must_match_stones() {
        let err = deserialize(root("HA[5]AB[cc][gg]").as_bytes()).unwrap_err();
        assert!(matches!(err, MalformedSnapshotError::InvalidValue { ref property, .. } if property == "HA"));

        let err = deserialize(root("HA[0]AB[cc][gg]").as_bytes()).unwrap_err();
        assert!(matches!(err, MalformedSnapshotError::InvalidValue { ref property, .. } if property == "HA"));

        let decoded = deserialize(root("HA[2]AB[cc][gg]").as_bytes()).unwrap();
        assert_eq!(decoded.rules.handicap, 2);
        assert_eq!(decoded.handicap.len(), 2);
        assert_eq!(deserialize(root("HA[1]").as_bytes()).unwrap().rules.handicap, 1);
    }

    /// `XV` cannot point past the last move.
    #[test]
    fn viewed_position_past_last_move_is_rejected() {
        let err = deserialize(b"(;XF[1]SZ[9]XV[5];B[aa])").unwrap_err();
        assert_eq!(err, MalformedSnapshotError::PositionOutOfRange { position: 5, moves: 1 });
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        assert_eq!(deserialize(&[0x28, 0xff, 0xfe]).unwrap_err(), MalformedSnapshotError::NotUtf8);
    }
}
