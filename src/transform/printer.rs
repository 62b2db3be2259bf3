/// Renders synthetic nodes produced by a transform.
pub trait Printer {
    fn print(&self, kind: &str, text: &str) -> String;
}

/// Emits a synthetic node's text as given.
#[derive(Debug, Default, Clone, Copy)]
pub struct SourcePrinter;

impl Printer for SourcePrinter {
    fn print(&self, _kind: &str, text: &str) -> String {
        text.to_string()
    }
}

impl<F> Printer for F
where
    F: Fn(&str, &str) -> String,
{
    fn print(&self, kind: &str, text: &str) -> String {
        self(kind, text)
    }
}
