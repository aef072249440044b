//! The interactive editing session: a prompt loop that executes classified
//! commands against the line store. Also owns the save-and-exit flow.

use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::core::command::{self, Command};
use crate::core::config::EditorConfig;
use crate::core::file_system;
use crate::core::line_store::LineStore;

/// What the loop does after handling one input line
enum Flow {
    Continue,
    Exit,
}

/// An interactive editing session.
///
/// Generic over its input and output handles so a whole session can be
/// driven from a scripted buffer in tests, with everything it printed
/// captured for inspection.
pub struct Editor<R, W> {
    store: LineStore,
    config: EditorConfig,
    file_name: Option<String>,
    current_line: usize,
    insert_mode: bool,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Editor<R, W> {
    /// Create a session over a (possibly preloaded) line store. The current
    /// line starts one past the stored tail.
    pub fn new(
        store: LineStore,
        config: EditorConfig,
        file_name: Option<String>,
        input: R,
        output: W,
    ) -> Self {
        let current_line = store.count() + 1;
        Self {
            store,
            config,
            file_name,
            current_line,
            insert_mode: false,
            input,
            output,
        }
    }

    /// Run the prompt loop until `E` saves and exits, or the input ends
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.show_prompt()?;
            let line = match self.read_line()? {
                Some(line) => line,
                None => {
                    tracing::warn!("input closed before save-and-exit; nothing written");
                    return Ok(());
                }
            };
            match self.handle_input(&line)? {
                Flow::Continue => {}
                Flow::Exit => return Ok(()),
            }
        }
    }

    /// Dispatch one input line: a recognized command executes, anything
    /// else goes into the document as text
    fn handle_input(&mut self, input: &str) -> Result<Flow> {
        match command::classify(input) {
            Some(cmd) => self.execute(cmd),
            None => {
                self.add_text(input);
                Ok(Flow::Continue)
            }
        }
    }

    fn execute(&mut self, cmd: Command) -> Result<Flow> {
        match cmd {
            Command::List => self.list_all()?,
            Command::ListLine(n) => self.list_line(n)?,
            Command::ListRange(n, m) => self.list_range(n, m)?,
            Command::Delete => self.delete_last(),
            Command::DeleteLine(n) => self.delete_line(n),
            Command::DeleteRange(n, m) => self.delete_range(n, m),
            Command::Insert => self.toggle_insert(),
            Command::InsertAt(n) => self.insert_at(n),
            Command::Exit => {
                self.save_and_exit()?;
                return Ok(Flow::Exit);
            }
        }
        Ok(Flow::Continue)
    }

    fn list_all(&mut self) -> Result<()> {
        for line in self.store.iter() {
            writeln!(self.output, "{}", line).context("Failed to write listing")?;
        }
        Ok(())
    }

    /// List line n when it is within bounds; out of bounds lists nothing
    fn list_line(&mut self, n: usize) -> Result<()> {
        if n >= 1 && n <= self.store.count() {
            if let Some(line) = self.store.iter().find(|line| line.index == n) {
                writeln!(self.output, "{}", line).context("Failed to write listing")?;
            }
        }
        Ok(())
    }

    /// List lines n through m. Requires n < m as given; n is then raised
    /// to 1 and m lowered to the line count.
    fn list_range(&mut self, n: usize, m: usize) -> Result<()> {
        if n >= m {
            return Ok(());
        }
        let count = self.store.count();
        let n = n.max(1);
        if n > count {
            return Ok(());
        }
        let m = m.min(count);
        for line in self.store.iter() {
            if line.index >= n && line.index <= m {
                writeln!(self.output, "{}", line).context("Failed to write listing")?;
            }
        }
        Ok(())
    }

    /// Delete the tail line. Gated on the current line so an empty
    /// document is left alone. No renumber: tail removal keeps the
    /// numbering contiguous.
    fn delete_last(&mut self) {
        if self.current_line > 1 {
            let last = self.store.count();
            self.store.delete(last);
            self.current_line = last;
        }
    }

    fn delete_line(&mut self, n: usize) {
        let count = self.store.count();
        if n >= 1 && n <= count {
            self.store.delete(n);
            self.store.renumber();
            self.current_line = count;
        }
    }

    /// Delete lines n through m inclusive, with the same argument rules as
    /// [`list_range`](Editor::list_range)
    fn delete_range(&mut self, n: usize, m: usize) {
        if n >= m {
            return;
        }
        let mut count = self.store.count();
        let n = n.max(1);
        if n > count {
            return;
        }
        let m = m.min(count);
        // Tags keep their pre-deletion identity until the renumber, so the
        // loop addresses the original numbering while the store shrinks.
        for tag in n..=m {
            self.store.delete(tag);
            count -= 1;
        }
        self.store.renumber();
        self.current_line = count + 1;
    }

    /// Toggle insert mode. Entering pins the current line at the tail;
    /// leaving puts it back one past the tail.
    fn toggle_insert(&mut self) {
        let count = self.store.count();
        if self.insert_mode {
            self.insert_mode = false;
            self.current_line = count + 1;
        } else {
            self.insert_mode = true;
            self.current_line = count;
        }
    }

    /// Enter insert mode pinned at line n: the next text entry lands at n
    /// and pushes the old line n forward. Ignored when already pinned or
    /// when n is out of bounds.
    fn insert_at(&mut self, n: usize) {
        if n >= 1 && n <= self.store.count() && !self.insert_mode {
            self.insert_mode = true;
            self.current_line = n;
        }
    }

    /// Put one line of text into the document. Insert mode accepts exactly
    /// one line per activation, then reverts to appending at the tail.
    fn add_text(&mut self, text: &str) {
        if self.insert_mode {
            self.store.insert(self.current_line, self.current_line, text);
            self.store.renumber();
            self.current_line = self.store.count() + 1;
            self.insert_mode = false;
        } else {
            self.store.add(self.current_line, text);
            self.current_line += 1;
        }
    }

    /// Bind a filename (prompting when none is bound yet) and write the
    /// document out. The session ends regardless of the save outcome.
    fn save_and_exit(&mut self) -> Result<()> {
        let name = match self.file_name.take() {
            Some(name) => Some(name),
            None => self.prompt_file_name()?,
        };
        let name = match name {
            Some(name) => name,
            None => {
                tracing::warn!("input closed during filename entry; nothing written");
                return Ok(());
            }
        };
        self.write_document(&name)?;
        self.file_name = Some(name);
        Ok(())
    }

    /// Write the document to the named file, reporting the outcome. A
    /// failed save is reported but never aborts the exit.
    fn write_document(&mut self, name: &str) -> Result<()> {
        write!(self.output, "Writing... ").context("Failed to write output")?;
        self.output.flush().context("Failed to flush output")?;

        let texts: Vec<&str> = self.store.iter().map(|line| line.text.as_str()).collect();
        match file_system::save_lines(Path::new(name), &texts) {
            Ok(()) => writeln!(self.output, "Complete!").context("Failed to write output")?,
            Err(e) => {
                writeln!(self.output, "{}", e).context("Failed to write output")?;
                tracing::error!("save to {} failed: {}", name, e);
            }
        }
        Ok(())
    }

    /// Prompt until a usable filename is entered, extending extension-less
    /// entries with the configured default and asking before an overwrite.
    /// `None` when the input ends first.
    fn prompt_file_name(&mut self) -> Result<Option<String>> {
        loop {
            let entered = match self.prompt("Enter filename: ")? {
                Some(entered) => entered,
                None => return Ok(None),
            };
            let name =
                file_system::ensure_extension(&entered, &self.config.default_extension);

            if self.config.confirm_overwrite && file_system::file_exists(Path::new(&name)) {
                writeln!(self.output).context("Failed to write output")?;
                writeln!(self.output, "File: {} already exists.", name)
                    .context("Failed to write output")?;
                if !self.overwrite_accepted()? {
                    continue;
                }
            }

            match file_system::validate_file_name(&name) {
                Ok(()) => return Ok(Some(name)),
                Err(reason) => {
                    writeln!(self.output, "{}", reason).context("Failed to write output")?;
                }
            }
        }
    }

    /// Ask until the reply contains `Y` or `N`; `Y` wins when both appear.
    /// The input ending counts as no.
    fn overwrite_accepted(&mut self) -> Result<bool> {
        loop {
            let reply = match self.prompt("Would you like to overwrite it? (Y/N) ")? {
                Some(reply) => reply,
                None => return Ok(false),
            };
            if reply.contains('Y') {
                return Ok(true);
            }
            if reply.contains('N') {
                return Ok(false);
            }
        }
    }

    /// Print a message and block on one line of input
    fn prompt(&mut self, message: &str) -> Result<Option<String>> {
        write!(self.output, "{}", message).context("Failed to write prompt")?;
        self.output.flush().context("Failed to flush prompt")?;
        self.read_line()
    }

    /// Print the line prompt, prefixed with `I` while in insert mode
    fn show_prompt(&mut self) -> Result<()> {
        if self.insert_mode {
            write!(self.output, "I {}> ", self.current_line).context("Failed to write prompt")?;
        } else {
            write!(self.output, "{}> ", self.current_line).context("Failed to write prompt")?;
        }
        self.output.flush().context("Failed to flush prompt")
    }

    /// Read one line, stripping the trailing newline. `None` at end of
    /// input.
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("Failed to read input")?;
        if read == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    type TestEditor = Editor<Cursor<Vec<u8>>, Vec<u8>>;

    fn store_with(texts: &[&str]) -> LineStore {
        let mut store = LineStore::new();
        for (pos, text) in texts.iter().enumerate() {
            store.add(pos + 1, *text);
        }
        store
    }

    fn editor_over(texts: &[&str], script: &str) -> TestEditor {
        Editor::new(
            store_with(texts),
            EditorConfig::default(),
            None,
            Cursor::new(script.as_bytes().to_vec()),
            Vec::new(),
        )
    }

    fn run_session(texts: &[&str], script: &str) -> TestEditor {
        let mut editor = editor_over(texts, script);
        editor.run().unwrap();
        editor
    }

    fn output(editor: &TestEditor) -> String {
        String::from_utf8(editor.output.clone()).unwrap()
    }

    fn doc(editor: &TestEditor) -> Vec<&str> {
        editor.store.iter().map(|line| line.text.as_str()).collect()
    }

    fn doc_indices(editor: &TestEditor) -> Vec<usize> {
        editor.store.iter().map(|line| line.index).collect()
    }

    #[test]
    fn test_empty_session_prompts_at_line_one() {
        let editor = run_session(&[], "");
        assert_eq!(output(&editor), "1> ");
        assert_eq!(editor.current_line, 1);
    }

    #[test]
    fn test_preloaded_store_starts_past_tail() {
        let editor = editor_over(&["a", "b"], "");
        assert_eq!(editor.current_line, 3);
        assert!(!editor.insert_mode);
    }

    #[test]
    fn test_append_advances_current_line() {
        let editor = run_session(&[], "hello\nworld\n");
        assert_eq!(doc(&editor), vec!["hello", "world"]);
        assert_eq!(doc_indices(&editor), vec![1, 2]);
        assert_eq!(editor.current_line, 3);
    }

    #[test]
    fn test_listing_session_output() {
        let editor = run_session(&[], "hello\nworld\nL\n");
        assert_eq!(output(&editor), "1> 2> 3> 1> hello\n2> world\n3> ");
    }

    #[test]
    fn test_list_single_line_bounds() {
        let mut editor = editor_over(&["a", "b", "c"], "");
        editor.handle_input("L 2").unwrap();
        assert_eq!(output(&editor), "2> b\n");

        let mut editor = editor_over(&["a", "b", "c"], "");
        editor.handle_input("L 9").unwrap();
        editor.handle_input("L 0").unwrap();
        assert_eq!(output(&editor), "");
    }

    #[test]
    fn test_list_range_clamps_to_document() {
        let mut editor = editor_over(&["a", "b", "c", "d", "e"], "");
        editor.handle_input("L 2 4").unwrap();
        assert_eq!(output(&editor), "2> b\n3> c\n4> d\n");

        let mut editor = editor_over(&["a", "b", "c", "d", "e"], "");
        editor.handle_input("L 0 99").unwrap();
        assert_eq!(output(&editor), "1> a\n2> b\n3> c\n4> d\n5> e\n");
    }

    #[test]
    fn test_list_range_requires_ascending_arguments() {
        let mut editor = editor_over(&["a", "b", "c"], "");
        editor.handle_input("L 3 1").unwrap();
        editor.handle_input("L 2 2").unwrap();
        assert_eq!(output(&editor), "");
    }

    #[test]
    fn test_delete_last_requires_content() {
        let mut editor = editor_over(&[], "");
        editor.handle_input("D").unwrap();
        assert_eq!(editor.store.count(), 0);
        assert_eq!(editor.current_line, 1);

        let mut editor = editor_over(&["a", "b", "c"], "");
        editor.handle_input("D").unwrap();
        assert_eq!(doc(&editor), vec!["a", "b"]);
        assert_eq!(editor.current_line, 3);
    }

    #[test]
    fn test_delete_line_renumbers_and_sets_current() {
        let mut editor = editor_over(&["a", "b", "c"], "");
        editor.handle_input("D 2").unwrap();
        assert_eq!(doc(&editor), vec!["a", "c"]);
        assert_eq!(doc_indices(&editor), vec![1, 2]);
        assert_eq!(editor.current_line, 3);
    }

    #[test]
    fn test_delete_line_out_of_bounds_is_ignored() {
        let mut editor = editor_over(&["a", "b"], "");
        editor.handle_input("D 5").unwrap();
        editor.handle_input("D 0").unwrap();
        assert_eq!(doc(&editor), vec!["a", "b"]);
        assert_eq!(editor.current_line, 3);
    }

    #[test]
    fn test_delete_range_clamps_and_renumbers() {
        let mut editor = editor_over(&["a", "b", "c", "d", "e"], "");
        editor.handle_input("D 2 4").unwrap();
        assert_eq!(doc(&editor), vec!["a", "e"]);
        assert_eq!(doc_indices(&editor), vec![1, 2]);
        assert_eq!(editor.current_line, 3);

        let mut editor = editor_over(&["a", "b", "c"], "");
        editor.handle_input("D 0 99").unwrap();
        assert_eq!(editor.store.count(), 0);
        assert_eq!(editor.current_line, 1);
    }

    #[test]
    fn test_delete_range_requires_ascending_arguments() {
        let mut editor = editor_over(&["a", "b", "c"], "");
        editor.handle_input("D 3 1").unwrap();
        editor.handle_input("D 2 2").unwrap();
        assert_eq!(doc(&editor), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_insert_toggle_pins_then_releases() {
        let mut editor = editor_over(&["a", "b", "c"], "");
        editor.handle_input("I").unwrap();
        assert!(editor.insert_mode);
        assert_eq!(editor.current_line, 3);

        editor.handle_input("I").unwrap();
        assert!(!editor.insert_mode);
        assert_eq!(editor.current_line, 4);
    }

    #[test]
    fn test_insert_takes_one_line_then_reverts() {
        let mut editor = editor_over(&["a", "b", "c"], "");
        editor.handle_input("I").unwrap();
        editor.handle_input("x").unwrap();
        assert_eq!(doc(&editor), vec!["a", "b", "x", "c"]);
        assert_eq!(doc_indices(&editor), vec![1, 2, 3, 4]);
        assert!(!editor.insert_mode);
        assert_eq!(editor.current_line, 5);

        // back to appending at the tail
        editor.handle_input("y").unwrap();
        assert_eq!(doc(&editor), vec!["a", "b", "x", "c", "y"]);
    }

    #[test]
    fn test_insert_at_line_pushes_old_line_forward() {
        let mut editor = editor_over(&["a", "b", "c"], "");
        editor.handle_input("I 2").unwrap();
        editor.handle_input("x").unwrap();
        assert_eq!(doc(&editor), vec!["a", "x", "b", "c"]);
        assert!(!editor.insert_mode);
        assert_eq!(editor.current_line, 5);
    }

    #[test]
    fn test_insert_at_ignored_when_pinned_or_out_of_bounds() {
        let mut editor = editor_over(&["a", "b", "c"], "");
        editor.handle_input("I 9").unwrap();
        editor.handle_input("I 0").unwrap();
        assert!(!editor.insert_mode);
        assert_eq!(editor.current_line, 4);

        editor.handle_input("I").unwrap();
        editor.handle_input("I 2").unwrap();
        assert!(editor.insert_mode);
        assert_eq!(editor.current_line, 3);
    }

    #[test]
    fn test_insert_on_empty_store_swallows_text() {
        let mut editor = editor_over(&[], "");
        editor.handle_input("I").unwrap();
        assert_eq!(editor.current_line, 0);

        editor.handle_input("x").unwrap();
        assert_eq!(editor.store.count(), 0);
        assert!(!editor.insert_mode);
        assert_eq!(editor.current_line, 1);
    }

    #[test]
    fn test_commands_still_run_while_pinned() {
        let editor = run_session(&["a", "b"], "I\nL\nx\n");
        assert_eq!(output(&editor), "3> I 2> 1> a\n2> b\nI 2> 4> ");
        assert_eq!(doc(&editor), vec!["a", "x", "b"]);
    }

    #[test]
    fn test_text_near_command_shapes_is_appended() {
        let editor = run_session(&[], "L 1 2 3\nl\nD  4\nI 4 7\n");
        assert_eq!(doc(&editor), vec!["L 1 2 3", "l", "D  4", "I 4 7"]);
    }

    #[test]
    fn test_prompt_prefix_in_insert_mode() {
        let editor = run_session(&[], "hello\nI\n");
        assert_eq!(output(&editor), "1> 2> I 1> ");
    }

    #[test]
    fn test_crlf_input_is_stripped() {
        let editor = run_session(&[], "hello\r\nL\r\n");
        assert_eq!(output(&editor), "1> 2> 1> hello\n2> ");
        assert_eq!(doc(&editor), vec!["hello"]);
    }

    #[test]
    fn test_exit_writes_bound_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        let name = path.to_str().unwrap().to_string();

        let mut editor = Editor::new(
            store_with(&[]),
            EditorConfig::default(),
            Some(name.clone()),
            Cursor::new(b"hello\nworld\nD 1\nL\nE\n".to_vec()),
            Vec::new(),
        );
        editor.run().unwrap();

        assert_eq!(
            output(&editor),
            "1> 2> 3> 2> 1> world\n2> Writing... Complete!\n"
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "world");
        assert_eq!(editor.file_name, Some(name));
    }

    #[test]
    fn test_exit_eof_at_filename_prompt_writes_nothing() {
        let editor = run_session(&[], "alpha\nE\n");
        assert_eq!(output(&editor), "1> 2> Enter filename: ");
        assert_eq!(editor.file_name, None);
    }

    #[test]
    fn test_exit_reports_failed_save_and_still_exits() {
        let dir = tempfile::tempdir().unwrap();
        let name = dir
            .path()
            .join("missing")
            .join("doc.txt")
            .to_str()
            .unwrap()
            .to_string();

        let mut editor = Editor::new(
            store_with(&[]),
            EditorConfig::default(),
            Some(name),
            Cursor::new(b"x\nE\n".to_vec()),
            Vec::new(),
        );
        editor.run().unwrap();

        let out = output(&editor);
        assert!(out.contains("Writing... "));
        assert!(out.contains("Unable to open"));
        assert!(!out.contains("Complete!"));
    }

    // The filename prompt only accepts bare names, so this one test works
    // in a scratch current directory; everything else sticks to absolute
    // paths to stay independent of it.
    #[test]
    fn test_exit_filename_flow() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();
        std::fs::write("notes.txt", "old").unwrap();

        // rejected name, then a declined overwrite, then an accepted one
        let editor = run_session(&[], "alpha\nE\nbad*name\nnotes\nwhat\nN\nnotes\nY\n");
        let out = output(&editor);
        assert!(out.contains("Filename cannot contain '*'"));
        assert!(out.contains("\nFile: notes.txt already exists.\n"));
        assert_eq!(
            out.matches("Would you like to overwrite it? (Y/N) ").count(),
            3
        );
        assert!(out.ends_with("Writing... Complete!\n"));
        assert_eq!(std::fs::read_to_string("notes.txt").unwrap(), "alpha");
        assert_eq!(editor.file_name, Some("notes.txt".to_string()));

        // with confirmation disabled the existing file is replaced outright
        let mut editor = Editor::new(
            store_with(&[]),
            EditorConfig {
                confirm_overwrite: false,
                ..EditorConfig::default()
            },
            None,
            Cursor::new(b"beta\nE\nnotes\n".to_vec()),
            Vec::new(),
        );
        editor.run().unwrap();
        assert!(!output(&editor).contains("already exists"));
        assert_eq!(std::fs::read_to_string("notes.txt").unwrap(), "beta");
    }
}
