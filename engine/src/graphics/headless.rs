//! In-memory device for tests.
//!
//! Tracks every allocation and release so tests can assert on resource counts, and mimics
//! just enough driver behaviour to exercise the failure paths: `#error` directives and
//! unbalanced brackets fail compilation, a stage without `void main` fails linking, and the
//! last `vec4(r, g, b, a)` literal in the active fragment stage is the colour it "draws".

use std::cell::RefCell;

use rustc_hash::FxHashMap;

use crate::graphics::{GraphicsDevice, StageKind, UniformValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct HeadlessShader(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct HeadlessProgram(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct HeadlessUniform(u32);

#[derive(Debug)]
struct ShaderObject {
    stage: StageKind,
    source: String,
    log: String,
}

#[derive(Debug, Default)]
struct ProgramObject {
    attached: Vec<u32>,
    attributes: Vec<(u32, String)>,
    linked: bool,
    log: String,
}

#[derive(Debug, Default)]
struct State {
    next_id: u32,
    shaders: FxHashMap<u32, ShaderObject>,
    programs: FxHashMap<u32, ProgramObject>,
    locations: FxHashMap<u32, (u32, String)>,
    uploads: FxHashMap<(u32, String), UniformValue>,
    active: Option<u32>,
    /// Sources containing any of these fail to compile.
    rejected: Vec<String>,
    shaders_created: usize,
    invalid_releases: usize,
}

impl State {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn stage_sources(&self, program: u32) -> Vec<(StageKind, &str)> {
        self.programs
            .get(&program)
            .map(|p| {
                p.attached
                    .iter()
                    .filter_map(|id| self.shaders.get(id))
                    .map(|s| (s.stage, s.source.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Default)]
pub(crate) struct HeadlessDevice {
    state: RefCell<State>,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later compile of a source containing `needle` fail.
    pub fn reject_sources_containing(&self, needle: &str) {
        self.state.borrow_mut().rejected.push(needle.to_string());
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn shaders_created(&self) -> usize {
        self.state.borrow().shaders_created
    }

    /// Deletes of handles that were never created or were already deleted.
    pub fn invalid_releases(&self) -> usize {
        self.state.borrow().invalid_releases
    }

    pub fn active_program(&self) -> Option<HeadlessProgram> {
        self.state.borrow().active.map(HeadlessProgram)
    }

    pub fn attribute_bindings(&self, program: HeadlessProgram) -> Vec<(u32, String)> {
        self.state
            .borrow()
            .programs
            .get(&program.0)
            .map(|p| p.attributes.clone())
            .unwrap_or_default()
    }

    /// Last value uploaded to `name` on the active program.
    pub fn uniform_value(&self, name: &str) -> Option<UniformValue> {
        let state = self.state.borrow();
        let active = state.active?;
        state.uploads.get(&(active, name.to_string())).copied()
    }

    /// The solid colour the active program fills the quad with, if it's a constant.
    pub fn draw_color(&self) -> Option<[f32; 4]> {
        let state = self.state.borrow();
        let active = state.active?;
        if !state.programs.get(&active)?.linked {
            return None;
        }
        let (_, fragment) = state
            .stage_sources(active)
            .into_iter()
            .find(|(stage, _)| *stage == StageKind::Fragment)?;
        constant_color(fragment)
    }
}

fn constant_color(source: &str) -> Option<[f32; 4]> {
    let start = source.rfind("vec4(")? + "vec4(".len();
    let end = start + source[start..].find(')')?;
    let parts = source[start..end]
        .split(',')
        .map(|p| p.trim().parse::<f32>().ok())
        .collect::<Option<Vec<_>>>()?;
    <[f32; 4]>::try_from(parts).ok()
}

fn compile_log(source: &str) -> Option<String> {
    for (line, text) in source.lines().enumerate() {
        if let Some(message) = text.trim_start().strip_prefix("#error") {
            return Some(format!("0:{}: '#error' : {}", line + 1, message.trim()));
        }
    }
    let balanced = |open: char, close: char| {
        source.chars().filter(|&c| c == open).count()
            == source.chars().filter(|&c| c == close).count()
    };
    if !balanced('{', '}') || !balanced('(', ')') {
        return Some(format!(
            "0:{}: '' : syntax error, unexpected end of file",
            source.lines().count()
        ));
    }
    None
}

fn declares_uniform(source: &str, name: &str) -> bool {
    source.lines().any(|line| {
        let tokens = line
            .trim()
            .trim_end_matches(';')
            .split_whitespace()
            .collect::<Vec<_>>();
        tokens.len() >= 3 && tokens[0] == "uniform" && tokens[2] == name
    })
}

impl GraphicsDevice for HeadlessDevice {
    type Shader = HeadlessShader;
    type Program = HeadlessProgram;
    type UniformLocation = HeadlessUniform;

    fn create_shader(&self, stage: StageKind) -> Result<Self::Shader, String> {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.shaders.insert(
            id,
            ShaderObject {
                stage,
                source: String::new(),
                log: String::new(),
            },
        );
        state.shaders_created += 1;
        Ok(HeadlessShader(id))
    }

    fn compile_shader(&self, shader: Self::Shader, source: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let rejected = state
            .rejected
            .iter()
            .find(|needle| source.contains(needle.as_str()))
            .map(|needle| format!("0:1: '' : rejected source containing '{needle}'"));
        let Some(object) = state.shaders.get_mut(&shader.0) else {
            return false;
        };
        object.source = source.to_string();
        match rejected.or_else(|| compile_log(source)) {
            Some(log) => {
                object.log = log;
                false
            }
            None => true,
        }
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        self.state
            .borrow()
            .shaders
            .get(&shader.0)
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: Self::Shader) {
        let mut state = self.state.borrow_mut();
        if state.shaders.remove(&shader.0).is_none() {
            state.invalid_releases += 1;
        }
    }

    fn create_program(&self) -> Result<Self::Program, String> {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.programs.insert(id, ProgramObject::default());
        Ok(HeadlessProgram(id))
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        if let Some(p) = self.state.borrow_mut().programs.get_mut(&program.0) {
            p.attached.push(shader.0);
        }
    }

    fn bind_attrib_location(&self, program: Self::Program, slot: u32, name: &str) {
        if let Some(p) = self.state.borrow_mut().programs.get_mut(&program.0) {
            p.attributes.push((slot, name.to_string()));
        }
    }

    fn link_program(&self, program: Self::Program) -> bool {
        let mut state = self.state.borrow_mut();
        let stages = state.stage_sources(program.0);
        let mut log = String::new();
        for kind in [StageKind::Vertex, StageKind::Fragment] {
            match stages.iter().find(|(stage, _)| *stage == kind) {
                None => log.push_str(&format!("error: no {kind} shader attached\n")),
                Some((_, source)) if !source.contains("void main") => {
                    log.push_str(&format!("error: {kind} shader lacks `main'\n"))
                }
                Some(_) => {}
            }
        }
        let Some(p) = state.programs.get_mut(&program.0) else {
            return false;
        };
        p.linked = log.is_empty();
        p.log = log;
        p.linked
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        self.state
            .borrow()
            .programs
            .get(&program.0)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn delete_program(&self, program: Self::Program) {
        let mut state = self.state.borrow_mut();
        if state.programs.remove(&program.0).is_none() {
            state.invalid_releases += 1;
        }
        state.uploads.retain(|(p, _), _| *p != program.0);
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        let mut state = self.state.borrow_mut();
        if !state.programs.get(&program.0)?.linked {
            return None;
        }
        let declared = state
            .stage_sources(program.0)
            .iter()
            .any(|(_, source)| declares_uniform(source, name));
        if !declared {
            return None;
        }
        let id = state.next_id();
        state.locations.insert(id, (program.0, name.to_string()));
        Some(HeadlessUniform(id))
    }

    fn use_program(&self, program: Self::Program) {
        self.state.borrow_mut().active = Some(program.0);
    }

    fn set_uniform(&self, location: &Self::UniformLocation, value: UniformValue) {
        let mut state = self.state.borrow_mut();
        let Some((program, name)) = state.locations.get(&location.0).cloned() else {
            return;
        };
        // Like GL, uploads land on the program in use.
        if state.active == Some(program) {
            state.uploads.insert((program, name), value);
        }
    }
}
