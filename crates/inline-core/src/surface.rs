use crate::tree::Node;

/// The host's editable surface. The editor pushes its state here at commit
/// points; the host reports keystrokes, input and selection back through
/// [`crate::InlineEditor`].
pub trait Surface {
    fn replace_content(&mut self, nodes: &[Node]);
    fn set_caret(&mut self, offset: usize);
    fn focus(&mut self);
    fn blur(&mut self);
}

/// Keeps whatever the editor last pushed. Used by the demo harness and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingSurface {
    pub nodes: Vec<Node>,
    pub caret: usize,
    pub focused: bool,
    pub commits: usize,
}

impl Surface for RecordingSurface {
    fn replace_content(&mut self, nodes: &[Node]) {
        self.nodes = nodes.to_vec();
        self.commits += 1;
    }

    fn set_caret(&mut self, offset: usize) {
        self.caret = offset;
    }

    fn focus(&mut self) {
        self.focused = true;
    }

    fn blur(&mut self) {
        self.focused = false;
    }
}
