#[derive(Debug, Clone)]
struct RelationEnv {
    primary: PrimaryRelation,
    joined: Vec<EmbeddedTarget>,
}

#[derive(Debug, Clone)]
struct PrimaryRelation {
    name: String,
    alias: Option<String>,
}

impl PrimaryRelation {
    fn reference(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

impl RelationEnv {
    fn find_joined(&self, qualifier: &str) -> Option<&EmbeddedTarget> {
        self.joined.iter().find(|target| {
            target.alias.as_deref() == Some(qualifier) || target.relation == qualifier
        })
    }
}

#[derive(Debug, Clone)]
struct LoweredTarget {
    qualifier: Option<String>,
    target: Target,
}

#[derive(Debug, Clone, PartialEq)]
struct ResolvedColumn {
    qualifier: Option<String>,
    column: String,
}

impl ResolvedColumn {
    fn render(&self, syntax: NameSyntax) -> String {
        match (&self.qualifier, syntax) {
            (None, _) => self.column.clone(),
            (Some(qualifier), NameSyntax::Dot) => format!("{qualifier}.{}", self.column),
            (Some(qualifier), NameSyntax::Parenthesized) => {
                format!("{qualifier}({})", self.column)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameSyntax {
    Dot,
    Parenthesized,
}
