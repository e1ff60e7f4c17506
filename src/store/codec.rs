//! Versioned plain-text encoding of a graph
//!
//! ```text
//! n3graph-text 1
//! @prefix ex: <http://example.org/> .
//! <http://example.org/s> <http://example.org/p> "o"@en .
//! _:b0 ex:q { <http://example.org/a> <http://example.org/b> ?x . } .
//! ```
//!
//! The header line comes first, then prefix declarations, then one triple
//! per line. Tokens are separated by whitespace. Lines starting with `#`
//! and blank lines are ignored. Triples are written in sorted order so the
//! encoding of a graph is stable.

use std::io::{Read, Write};
use std::sync::OnceLock;

use nom::{
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace0},
    sequence::{delimited, preceded},
    IResult,
};
use percent_encoding::percent_decode_str;
use regex::Regex;
use tracing::debug;

use super::Graph;
use crate::config::GraphConfig;
use crate::core::NamespaceMap;
use crate::error::{Error, Result};
use crate::term::{Literal, Node, Triple, Uri};

/// Format name on the header line
pub const FORMAT: &str = "n3graph-text";
/// Current format version
pub const VERSION: &str = "1";

fn language_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z]{1,8}(-[A-Za-z0-9]{1,8})*$").expect("language tag pattern is valid"))
}

/// Encode a graph as text
pub fn encode(graph: &Graph) -> String {
    let mut out = format!("{} {}\n", FORMAT, VERSION);
    for (prefix, uri) in graph.namespaces().iter() {
        out.push_str(&format!("@prefix {}: {} .\n", prefix, uri));
    }
    for triple in graph.sorted_triples() {
        out.push_str(&triple.to_string());
        out.push('\n');
    }
    out
}

/// Write the encoding of a graph
pub fn write_graph(graph: &Graph, writer: &mut impl Write) -> Result<()> {
    writer.write_all(encode(graph).as_bytes())?;
    Ok(())
}

/// Decode text into a new graph
pub fn decode(text: &str) -> Result<Graph> {
    decode_into(text, Graph::new())
}

/// Decode text into a graph built from `config`
pub fn decode_with_config(text: &str, config: &GraphConfig) -> Result<Graph> {
    decode_into(text, Graph::with_config(config))
}

/// Read and decode a graph
pub fn read_graph(reader: &mut impl Read) -> Result<Graph> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    decode(&text)
}

fn decode_into(text: &str, mut graph: Graph) -> Result<Graph> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'));

    let (line_no, header) = lines.next().ok_or(Error::MalformedEncoding {
        missing: "header".into(),
        line: 1,
    })?;
    match header.split_whitespace().collect::<Vec<_>>().as_slice() {
        [FORMAT, VERSION] => {}
        [FORMAT, other] => return Err(Error::UnsupportedVersion(other.to_string())),
        [FORMAT] => {
            return Err(Error::MalformedEncoding { missing: "version".into(), line: line_no })
        }
        _ => return Err(Error::MalformedEncoding { missing: "header".into(), line: line_no }),
    }

    let mut seen_triple = false;
    for (line_no, line) in lines {
        if let Some(rest) = line.strip_prefix("@prefix") {
            if seen_triple {
                debug!(line = line_no, "prefix declared after triples");
            }
            let (prefix, uri) = LineParser::new(rest, line_no, graph.namespaces()).prefix()?;
            graph.namespaces_mut().add(prefix, uri);
            continue;
        }
        let triple = LineParser::new(line, line_no, graph.namespaces()).statement()?;
        graph.assert(triple);
        seen_triple = true;
    }
    Ok(graph)
}

/// `<...>`
fn iri_ref(input: &str) -> IResult<&str, &str> {
    delimited(char('<'), take_while(|c: char| c != '>' && !c.is_whitespace()), char('>'))(input)
}

/// `?name`
fn variable_name(input: &str) -> IResult<&str, &str> {
    preceded(char('?'), take_while1(is_label_char))(input)
}

/// `_:label`
fn blank_label(input: &str) -> IResult<&str, &str> {
    preceded(tag("_:"), take_while1(is_label_char))(input)
}

/// Label characters, with `%XX` escapes for anything else
fn is_label_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '%')
}

/// `@tag`, validated separately
fn language_tag(input: &str) -> IResult<&str, &str> {
    preceded(char('@'), take_while1(|c: char| c.is_ascii_alphanumeric() || c == '-'))(input)
}

/// Prefix label before the `:` of a prefix declaration
fn prefix_label(input: &str) -> IResult<&str, &str> {
    take_while(|c: char| c != ':' && !c.is_whitespace())(input)
}

/// A prefixed name such as `ex:thing`
fn bare_token(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace() && !matches!(c, '{' | '}' | '<' | '"'))(input)
}

struct LineParser<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    namespaces: &'a NamespaceMap,
}

impl<'a> LineParser<'a> {
    fn new(input: &'a str, line: usize, namespaces: &'a NamespaceMap) -> Self {
        LineParser { input, pos: 0, line, namespaces }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Run a token parser at the current position, advancing on success
    fn lex<O>(&mut self, mut parser: impl FnMut(&'a str) -> IResult<&'a str, O>) -> Option<O> {
        match parser(self.rest()) {
            Ok((rest, out)) => {
                self.pos = self.input.len() - rest.len();
                Some(out)
            }
            Err(_) => None,
        }
    }

    fn skip_ws(&mut self) {
        self.lex(multispace0);
    }

    fn missing(&self, what: &str) -> Error {
        Error::MalformedEncoding { missing: what.to_string(), line: self.line }
    }

    fn invalid(&self, message: impl Into<String>) -> Error {
        Error::InvalidNodeSyntax { message: message.into(), line: self.line }
    }

    fn expect(&mut self, c: char, what: &str) -> Result<()> {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.bump();
            Ok(())
        } else {
            Err(self.missing(what))
        }
    }

    /// `name: <uri> .` (after the `@prefix` keyword)
    fn prefix(mut self) -> Result<(String, Uri)> {
        self.skip_ws();
        let name = self.lex(prefix_label).unwrap_or_default().to_string();
        self.expect(':', "':' after prefix name")?;
        self.skip_ws();
        if self.peek() != Some('<') {
            return Err(self.missing("namespace URI"));
        }
        let uri = self.uri()?;
        self.expect('.', "'.'")?;
        self.finish()?;
        Ok((name, uri))
    }

    /// A whole triple line
    fn statement(mut self) -> Result<Triple> {
        let triple = self.triple()?;
        self.finish()?;
        Ok(triple)
    }

    fn finish(&mut self) -> Result<()> {
        self.skip_ws();
        match self.peek() {
            None | Some('#') => Ok(()),
            Some(_) => Err(self.invalid(format!("unexpected '{}'", self.rest()))),
        }
    }

    fn triple(&mut self) -> Result<Triple> {
        let subject = self.position_node("subject")?;
        let predicate = self.position_node("predicate")?;
        let object = self.position_node("object")?;
        self.expect('.', "'.'")?;
        Triple::new(subject, predicate, object)
    }

    fn position_node(&mut self, what: &str) -> Result<Node> {
        self.skip_ws();
        match self.peek() {
            None | Some('.') | Some('}') => Err(self.missing(what)),
            Some(_) => self.node(),
        }
    }

    fn node(&mut self) -> Result<Node> {
        match self.peek() {
            Some('<') => Ok(Node::from(self.uri()?)),
            Some('"') => self.literal(),
            Some('{') => self.graph_literal(),
            Some('?') => {
                let name = self.lex(variable_name).ok_or_else(|| self.invalid("empty variable name"))?;
                Ok(Node::variable(self.unescape(name)?))
            }
            Some('_') if self.rest().starts_with("_:") => {
                let id = self.lex(blank_label).ok_or_else(|| self.invalid("empty blank node id"))?;
                Ok(Node::blank(self.unescape(id)?))
            }
            Some(_) => {
                let token = self.lex(bare_token).unwrap_or_default();
                Ok(Node::from(self.namespaces.resolve(token)?))
            }
            None => Err(self.missing("node")),
        }
    }

    fn unescape(&self, label: &str) -> Result<String> {
        percent_decode_str(label)
            .decode_utf8()
            .map(|decoded| decoded.into_owned())
            .map_err(|_| self.invalid("escaped label is not UTF-8"))
    }

    fn uri(&mut self) -> Result<Uri> {
        self.lex(iri_ref).map(Uri::new).ok_or_else(|| self.missing("'>'"))
    }

    fn literal(&mut self) -> Result<Node> {
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(self.missing("closing quote")),
                Some('"') => break,
                Some('\\') => match self.bump() {
                    Some('n') => value.push('\n'),
                    Some('r') => value.push('\r'),
                    Some('t') => value.push('\t'),
                    Some('"') => value.push('"'),
                    Some('\\') => value.push('\\'),
                    Some(c) => return Err(self.invalid(format!("unknown escape '\\{}'", c))),
                    None => return Err(self.missing("escaped character")),
                },
                Some(c) => value.push(c),
            }
        }

        if self.peek() == Some('@') {
            let lang = self.lex(language_tag).unwrap_or_default();
            if !language_tag_regex().is_match(lang) {
                return Err(self.invalid(format!("invalid language tag '{}'", lang)));
            }
            return Ok(Node::from(Literal::with_language(value, lang)));
        }
        if self.lex(tag("^^")).is_some() {
            let datatype = match self.peek() {
                Some('<') => self.uri()?,
                Some(_) => {
                    let token = self.lex(bare_token).unwrap_or_default();
                    self.namespaces.resolve(token)?
                }
                None => return Err(self.missing("datatype")),
            };
            return Ok(Node::from(Literal::typed(value, datatype.as_str())));
        }
        Ok(Node::from(Literal::plain(value)))
    }

    fn graph_literal(&mut self) -> Result<Node> {
        self.bump();
        let mut triples = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some('}') => {
                    self.bump();
                    break;
                }
                None => return Err(self.missing("'}'")),
                Some(_) => triples.push(self.triple()?),
            }
        }
        Ok(Node::graph_literal(triples))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(s: &str) -> Node {
        Node::uri(format!("http://example.org/{}", s))
    }

    fn t(s: Node, p: &str, o: Node) -> Triple {
        Triple::new(s, uri(p), o).unwrap()
    }

    fn sample() -> Graph {
        let mut g = Graph::new();
        g.namespaces_mut().add("ex", "http://example.org/");
        let b = g.create_blank_node();
        let quoted = Node::graph_literal(vec![t(uri("a"), "says", Node::variable("x"))]);
        g.assert(t(b.clone(), "name", Node::lang_literal("Zoë \"Z\"", "en")));
        g.assert(t(b.clone(), "age", Node::typed_literal("30", "http://www.w3.org/2001/XMLSchema#integer")));
        g.assert(t(b, "believes", quoted));
        g.assert(t(uri("s"), "note", Node::literal("line one\nline two\t\\")));
        g
    }

    #[test]
    fn test_round_trip() {
        let g = sample();
        let text = encode(&g);
        assert!(text.starts_with("n3graph-text 1\n@prefix ex: <http://example.org/> .\n"));

        let back = decode(&text).unwrap();
        assert_eq!(back.len(), g.len());
        assert!(back.equals(&g));
        assert_eq!(back.namespaces().get("ex").unwrap().as_str(), "http://example.org/");
        assert_eq!(encode(&back), text);
    }

    #[test]
    fn test_prefixed_names() {
        let text = "n3graph-text 1\n\
                    @prefix ex: <http://example.org/> .\n\
                    # a comment\n\
                    \n\
                    ex:s ex:p \"1\"^^<http://www.w3.org/2001/XMLSchema#integer> .\n";
        let g = decode(text).unwrap();
        assert!(g.contains(&t(
            uri("s"),
            "p",
            Node::typed_literal("1", "http://www.w3.org/2001/XMLSchema#integer")
        )));
    }

    #[test]
    fn test_missing_header() {
        let err = decode("<http://example.org/s> <http://example.org/p> \"o\" .").unwrap_err();
        assert!(matches!(err, Error::MalformedEncoding { line: 1, .. }));
        assert!(matches!(decode(""), Err(Error::MalformedEncoding { .. })));
    }

    #[test]
    fn test_unsupported_version() {
        assert!(matches!(decode("n3graph-text 2\n"), Err(Error::UnsupportedVersion(v)) if v == "2"));
    }

    #[test]
    fn test_missing_elements() {
        let err = decode("n3graph-text 1\n<http://example.org/s> <http://example.org/p> .\n").unwrap_err();
        match err {
            Error::MalformedEncoding { missing, line } => {
                assert_eq!(missing, "object");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error {:?}", other),
        }

        let err = decode("n3graph-text 1\n<http://example.org/s> <http://example.org/p> \"o\"\n").unwrap_err();
        assert!(matches!(err, Error::MalformedEncoding { ref missing, .. } if missing == "'.'"));

        let err = decode("n3graph-text 1\n_:b <http://example.org/p> { <http://example.org/a> <http://example.org/b> <http://example.org/c> .\n")
            .unwrap_err();
        assert!(matches!(err, Error::MalformedEncoding { ref missing, .. } if missing == "'}'"));
    }

    #[test]
    fn test_invalid_nodes() {
        let err = decode("n3graph-text 1\n\"lit\" <http://example.org/p> \"o\" .\n").unwrap_err();
        assert!(matches!(err, Error::InvalidTriple { .. }));

        let err = decode("n3graph-text 1\nfoaf:s <http://example.org/p> \"o\" .\n").unwrap_err();
        assert!(matches!(err, Error::NamespaceResolution { .. }));

        let err = decode("n3graph-text 1\n<http://example.org/s> <http://example.org/p> \"o\"@1bad-- .\n").unwrap_err();
        assert!(matches!(err, Error::InvalidNodeSyntax { line: 2, .. }));

        let err = decode("n3graph-text 1\n<http://example.org/s> <http://example.org/p> \"o\" . extra\n").unwrap_err();
        assert!(matches!(err, Error::InvalidNodeSyntax { .. }));
    }

    #[test]
    fn test_punctuated_labels_round_trip() {
        let mut g = Graph::new();
        let dotted = g.create_blank_node_with_id("a.b");
        let spaced = g.create_blank_node_with_id("x y");
        let quoted = Node::graph_literal(vec![t(uri("a"), "says", Node::variable("x.y"))]);
        g.assert(t(dotted.clone(), "knows", spaced.clone()));
        g.assert(t(spaced.clone(), "believes", quoted.clone()));

        let text = encode(&g);
        assert!(text.contains("_:a%2Eb"));
        assert!(text.contains("?x%2Ey"));

        let back = decode(&text).unwrap();
        assert!(back.contains(&t(dotted, "knows", spaced.clone())));
        assert!(back.contains(&t(spaced, "believes", quoted)));
    }

    #[test]
    fn test_decoded_blank_ids_are_reserved() {
        let mut g = decode("n3graph-text 1\n_:b0 <http://example.org/p> \"o\" .\n").unwrap();
        assert_ne!(g.create_blank_node(), Node::blank("b0"));
    }

    #[test]
    fn test_read_write() {
        let g = sample();
        let mut buf = Vec::new();
        write_graph(&g, &mut buf).unwrap();
        let back = read_graph(&mut buf.as_slice()).unwrap();
        assert!(back.equals(&g));
    }
}
