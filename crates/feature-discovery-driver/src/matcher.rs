//! Selector matching for the static backend.
//!
//! Covers the selector forms the discovery engine emits: type and universal
//! selectors, `#id`, `.class`, attribute selectors (`[a]`, `=`, `^=`, `$=`,
//! `*=`, `~=`, `|=`), descendant and child combinators, selector lists, and
//! the structural pseudo-classes `:first-child`, `:last-child`,
//! `:only-child`, `:nth-child(n)`, `:nth-of-type(n)` and `:not(compound)`.
//! Anything else is reported as unsupported.

/// Read access to an element tree, nodes addressed by index in document order.
pub trait ElementTree {
    /// Number of nodes.
    fn len(&self) -> usize;

    /// Whether the tree has no nodes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lower-case tag name.
    fn tag(&self, node: usize) -> &str;

    /// Attribute value.
    fn attribute(&self, node: usize, name: &str) -> Option<&str>;

    /// Parent node.
    fn parent(&self, node: usize) -> Option<usize>;

    /// Child nodes in order.
    fn children(&self, node: usize) -> &[usize];
}

/// Comma-separated list of complex selectors.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList(Vec<Complex>);

#[derive(Debug, Clone, PartialEq)]
struct Complex {
    compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeSelector>,
    pseudos: Vec<Pseudo>,
}

#[derive(Debug, Clone, PartialEq)]
struct AttributeSelector {
    name: String,
    test: Option<(AttributeOp, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum AttributeOp {
    Equals,
    Prefix,
    Suffix,
    Contains,
    Word,
    DashMatch,
}

#[derive(Debug, Clone, PartialEq)]
enum Pseudo {
    FirstChild,
    LastChild,
    OnlyChild,
    NthChild(usize),
    NthOfType(usize),
    Not(Box<Compound>),
}

impl SelectorList {
    /// Parse a selector, describing the first problem on failure.
    pub fn parse(selector: &str) -> Result<Self, String> {
        let mut parser = Parser {
            chars: selector.chars().collect(),
            pos: 0,
        };
        parser.parse_list().map(SelectorList)
    }

    /// Whether `node` matches any selector in the list.
    pub fn matches<T: ElementTree + ?Sized>(&self, tree: &T, node: usize) -> bool {
        self.0.iter().any(|complex| complex.matches(tree, node))
    }

    /// All matching nodes, in document order.
    pub fn query<T: ElementTree + ?Sized>(&self, tree: &T) -> Vec<usize> {
        (0..tree.len()).filter(|&n| self.matches(tree, n)).collect()
    }
}

impl Complex {
    fn matches<T: ElementTree + ?Sized>(&self, tree: &T, node: usize) -> bool {
        self.match_from(tree, node, self.compounds.len() - 1)
    }

    fn match_from<T: ElementTree + ?Sized>(&self, tree: &T, node: usize, i: usize) -> bool {
        if !self.compounds[i].matches(tree, node) {
            return false;
        }
        if i == 0 {
            return true;
        }
        match self.combinators[i - 1] {
            Combinator::Child => tree
                .parent(node)
                .is_some_and(|p| self.match_from(tree, p, i - 1)),
            Combinator::Descendant => {
                let mut current = tree.parent(node);
                while let Some(ancestor) = current {
                    if self.match_from(tree, ancestor, i - 1) {
                        return true;
                    }
                    current = tree.parent(ancestor);
                }
                false
            }
        }
    }
}

impl Compound {
    fn matches<T: ElementTree + ?Sized>(&self, tree: &T, node: usize) -> bool {
        if let Some(tag) = &self.tag {
            if tree.tag(node) != tag {
                return false;
            }
        }
        if self
            .ids
            .iter()
            .any(|id| tree.attribute(node, "id") != Some(id.as_str()))
        {
            return false;
        }
        if !self.classes.is_empty() {
            let class_attr = tree.attribute(node, "class").unwrap_or("");
            let classes: Vec<&str> = class_attr.split_whitespace().collect();
            if !self.classes.iter().all(|c| classes.contains(&c.as_str())) {
                return false;
            }
        }
        if !self.attributes.iter().all(|a| a.matches(tree, node)) {
            return false;
        }
        self.pseudos.iter().all(|p| p.matches(tree, node))
    }
}

impl AttributeSelector {
    fn matches<T: ElementTree + ?Sized>(&self, tree: &T, node: usize) -> bool {
        let Some(actual) = tree.attribute(node, &self.name) else {
            return false;
        };
        let Some((op, expected)) = &self.test else {
            return true;
        };
        match op {
            AttributeOp::Equals => actual == expected,
            AttributeOp::Prefix => !expected.is_empty() && actual.starts_with(expected.as_str()),
            AttributeOp::Suffix => !expected.is_empty() && actual.ends_with(expected.as_str()),
            AttributeOp::Contains => !expected.is_empty() && actual.contains(expected.as_str()),
            AttributeOp::Word => actual.split_whitespace().any(|w| w == expected),
            AttributeOp::DashMatch => {
                actual == expected || actual.starts_with(&format!("{expected}-"))
            }
        }
    }
}

impl Pseudo {
    fn matches<T: ElementTree + ?Sized>(&self, tree: &T, node: usize) -> bool {
        let siblings: &[usize] = match tree.parent(node) {
            Some(p) => tree.children(p),
            None => std::slice::from_ref(&node),
        };
        let position = siblings.iter().position(|&s| s == node);
        match self {
            Pseudo::FirstChild => position == Some(0),
            Pseudo::LastChild => position.is_some_and(|p| p + 1 == siblings.len()),
            Pseudo::OnlyChild => siblings.len() == 1,
            Pseudo::NthChild(n) => position.is_some_and(|p| p + 1 == *n),
            Pseudo::NthOfType(n) => {
                let tag = tree.tag(node);
                siblings
                    .iter()
                    .filter(|&&s| tree.tag(s) == tag)
                    .position(|&s| s == node)
                    .is_some_and(|p| p + 1 == *n)
            }
            Pseudo::Not(inner) => !inner.matches(tree, node),
        }
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        self.pos += 1;
        c
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn expect(&mut self, expected: char) -> Result<(), String> {
        match self.advance() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(format!("expected '{expected}' at {}, found '{c}'", self.pos - 1)),
            None => Err(format!("expected '{expected}' at end of selector")),
        }
    }

    fn parse_list(&mut self) -> Result<Vec<Complex>, String> {
        let mut list = Vec::new();
        loop {
            self.skip_whitespace();
            list.push(self.parse_complex()?);
            self.skip_whitespace();
            match self.peek() {
                None => return Ok(list),
                Some(',') => {
                    self.pos += 1;
                }
                Some(c) => return Err(format!("unexpected '{c}' at {}", self.pos)),
            }
        }
    }

    fn parse_complex(&mut self) -> Result<Complex, String> {
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_space = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    Combinator::Child
                }
                Some(c @ ('+' | '~')) => {
                    return Err(format!("sibling combinator '{c}' is not supported"))
                }
                Some(_) if had_space => Combinator::Descendant,
                Some(c) => return Err(format!("unexpected '{c}' at {}", self.pos)),
            };
            combinators.push(combinator);
            compounds.push(self.parse_compound()?);
        }
        Ok(Complex {
            compounds,
            combinators,
        })
    }

    fn parse_compound(&mut self) -> Result<Compound, String> {
        let mut compound = Compound::default();
        let mut parsed_any = false;

        match self.peek() {
            Some('*') => {
                self.pos += 1;
                parsed_any = true;
            }
            Some(c) if is_ident_start(c) => {
                compound.tag = Some(self.parse_ident()?.to_ascii_lowercase());
                parsed_any = true;
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.ids.push(self.parse_ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.parse_ident()?);
                }
                Some('[') => compound.attributes.push(self.parse_attribute()?),
                Some(':') => compound.pseudos.push(self.parse_pseudo()?),
                _ => break,
            }
            parsed_any = true;
        }

        if parsed_any {
            Ok(compound)
        } else {
            match self.peek() {
                Some(c) => Err(format!("expected selector at {}, found '{c}'", self.pos)),
                None => Err("expected selector at end of input".to_string()),
            }
        }
    }

    fn parse_ident(&mut self) -> Result<String, String> {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.pos += 1;
                match self.advance() {
                    Some(escaped) => ident.push(escaped),
                    None => return Err("dangling escape".to_string()),
                }
            } else if is_ident_char(c) {
                ident.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        if ident.is_empty() {
            Err(format!("expected identifier at {}", self.pos))
        } else {
            Ok(ident)
        }
    }

    fn parse_attribute(&mut self) -> Result<AttributeSelector, String> {
        self.expect('[')?;
        self.skip_whitespace();
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_whitespace();

        if self.peek() == Some(']') {
            self.pos += 1;
            return Ok(AttributeSelector { name, test: None });
        }

        let op = match self.advance() {
            Some('=') => AttributeOp::Equals,
            Some(c @ ('^' | '$' | '*' | '~' | '|')) => {
                self.expect('=')?;
                match c {
                    '^' => AttributeOp::Prefix,
                    '$' => AttributeOp::Suffix,
                    '*' => AttributeOp::Contains,
                    '~' => AttributeOp::Word,
                    _ => AttributeOp::DashMatch,
                }
            }
            Some(c) => return Err(format!("unexpected '{c}' in attribute selector")),
            None => return Err("unterminated attribute selector".to_string()),
        };

        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let mut value = String::new();
                loop {
                    match self.advance() {
                        Some('\\') => match self.advance() {
                            Some(c) => value.push(c),
                            None => return Err("dangling escape".to_string()),
                        },
                        Some(c) if c == quote => break,
                        Some(c) => value.push(c),
                        None => return Err("unterminated string".to_string()),
                    }
                }
                value
            }
            _ => self.parse_ident()?,
        };
        self.skip_whitespace();
        self.expect(']')?;

        Ok(AttributeSelector {
            name,
            test: Some((op, value)),
        })
    }

    fn parse_pseudo(&mut self) -> Result<Pseudo, String> {
        self.expect(':')?;
        if self.peek() == Some(':') {
            return Err("pseudo-elements are not supported".to_string());
        }
        let name = self.parse_ident()?.to_ascii_lowercase();
        match name.as_str() {
            "first-child" => Ok(Pseudo::FirstChild),
            "last-child" => Ok(Pseudo::LastChild),
            "only-child" => Ok(Pseudo::OnlyChild),
            "nth-child" => Ok(Pseudo::NthChild(self.parse_position()?)),
            "nth-of-type" => Ok(Pseudo::NthOfType(self.parse_position()?)),
            "not" => {
                self.expect('(')?;
                self.skip_whitespace();
                let inner = self.parse_compound()?;
                self.skip_whitespace();
                self.expect(')')?;
                Ok(Pseudo::Not(Box::new(inner)))
            }
            other => Err(format!("pseudo-class ':{other}' is not supported")),
        }
    }

    fn parse_position(&mut self) -> Result<usize, String> {
        self.expect('(')?;
        self.skip_whitespace();
        let mut digits = String::new();
        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            digits.push(c);
            self.pos += 1;
        }
        self.skip_whitespace();
        self.expect(')')?;
        digits
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| "only positive integer positions are supported".to_string())
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}
