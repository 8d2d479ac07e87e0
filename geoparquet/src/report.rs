// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Diagnostics produced by validation and the report that collects them.

use std::fmt::{Display, Formatter};

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Which validation layer produced a [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    /// Violation of the document schema: a missing member, a wrong type, a
    /// value outside an enumeration or a bad array length.
    Structural,
    /// Violation of a rule that spans several members or needs the table
    /// schema.
    Semantic,
}

impl Display for DiagnosticKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticKind::Structural => f.write_str("structural"),
            DiagnosticKind::Semantic => f.write_str("semantic"),
        }
    }
}

/// A single problem found in a document.
///
/// `location` is a JSON pointer (RFC 6901) into the validated document; the
/// empty string designates the document itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    kind: DiagnosticKind,
    location: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            location: location.into(),
            message: message.into(),
            hint: None,
        }
    }

    pub fn structural(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Structural, location, message)
    }

    pub fn semantic(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Semantic, location, message)
    }

    /// Attaches a human readable explanation of the violated rule.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let location = if self.location.is_empty() {
            "/"
        } else {
            &self.location
        };
        write!(f, "[{}] {}: {}", self.kind, location, self.message)
    }
}

/// Outcome of validating one document.
///
/// Structural diagnostics always precede semantic ones; within each layer
/// they follow document order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationReport {
    structural: Vec<Diagnostic>,
    semantic: Vec<Diagnostic>,
}

impl ValidationReport {
    pub fn new(structural: Vec<Diagnostic>, semantic: Vec<Diagnostic>) -> Self {
        Self {
            structural,
            semantic,
        }
    }

    /// Returns true if neither layer reported anything.
    pub fn is_valid(&self) -> bool {
        self.structural.is_empty() && self.semantic.is_empty()
    }

    pub fn structural(&self) -> &[Diagnostic] {
        &self.structural
    }

    pub fn semantic(&self) -> &[Diagnostic] {
        &self.semantic
    }

    /// All diagnostics, structural first.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.structural.iter().chain(self.semantic.iter())
    }

    pub fn len(&self) -> usize {
        self.structural.len() + self.semantic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.is_valid()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        let mut out = self.structural;
        out.extend(self.semantic);
        out
    }
}

impl Serialize for ValidationReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ValidationReport", 2)?;
        state.serialize_field("valid", &self.is_valid())?;
        state.serialize_field("diagnostics", &self.diagnostics().collect::<Vec<_>>())?;
        state.end()
    }
}

/// Builds a JSON pointer from unescaped reference tokens.
pub(crate) fn json_pointer<'a>(tokens: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for token in tokens {
        out.push('/');
        out.push_str(&token.replace('~', "~0").replace('/', "~1"));
    }
    out
}
