//! AST for a parsed input line.

/// A full input line: statements separated by `;`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Root {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Command(Command),
    Pipeline(Pipeline),
    /// Trailing `&`: the inner statement runs detached.
    Background(Box<Stmt>),
}

/// Two or more commands chained stdout→stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: Expr,
    pub args: Vec<Expr>,
    pub redirects: Redirects,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Redirects {
    /// Never produced by surface syntax (there is no `<`), but carried so
    /// the pipeline invariant (stdin inside a pipeline belongs to the pipe)
    /// has something to check against.
    pub stdin: Option<Source>,
    pub stdout: Vec<Target>,
    pub stderr: Vec<Target>,
}

impl Redirects {
    pub fn is_empty(&self) -> bool {
        self.stdin.is_none() && self.stdout.is_empty() && self.stderr.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectMode {
    /// `>`: truncate or create.
    Truncate,
    /// `>>`: append or create.
    Append,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub filename: Expr,
    pub mode: RedirectMode,
}

/// One word (or word part) of a command.
///
/// `DoubleQuoted` children expand in order and concatenate; the parser also
/// uses it as the concatenation node for mixed adjacent segments like
/// `a"b"$C`, so children are always `Raw` or `Variable`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Raw(String),
    SingleQuoted(String),
    DoubleQuoted(Vec<Expr>),
    /// Variable name with `$`/braces already stripped.
    Variable(String),
}

/// Borrowed view of any AST node, for [`inspect`].
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Root(&'a Root),
    Stmt(&'a Stmt),
    Command(&'a Command),
    Target(&'a Target),
    Expr(&'a Expr),
}

/// Depth-first walk. The callback returns `false` to skip a subtree.
pub fn inspect<'a>(root: &'a Root, f: &mut impl FnMut(Node<'a>) -> bool) {
    if !f(Node::Root(root)) {
        return;
    }
    for stmt in &root.statements {
        inspect_stmt(stmt, f);
    }
}

fn inspect_stmt<'a>(stmt: &'a Stmt, f: &mut impl FnMut(Node<'a>) -> bool) {
    if !f(Node::Stmt(stmt)) {
        return;
    }
    match stmt {
        Stmt::Command(command) => inspect_command(command, f),
        Stmt::Pipeline(pipeline) => {
            for command in &pipeline.commands {
                inspect_command(command, f);
            }
        }
        Stmt::Background(inner) => inspect_stmt(inner, f),
    }
}

fn inspect_command<'a>(command: &'a Command, f: &mut impl FnMut(Node<'a>) -> bool) {
    if !f(Node::Command(command)) {
        return;
    }
    inspect_expr(&command.name, f);
    for arg in &command.args {
        inspect_expr(arg, f);
    }
    if let Some(Source::File(expr)) = &command.redirects.stdin {
        inspect_expr(expr, f);
    }
    for target in command.redirects.stdout.iter().chain(&command.redirects.stderr) {
        if f(Node::Target(target)) {
            inspect_expr(&target.filename, f);
        }
    }
}

fn inspect_expr<'a>(expr: &'a Expr, f: &mut impl FnMut(Node<'a>) -> bool) {
    if !f(Node::Expr(expr)) {
        return;
    }
    if let Expr::DoubleQuoted(parts) = expr {
        for part in parts {
            inspect_expr(part, f);
        }
    }
}
