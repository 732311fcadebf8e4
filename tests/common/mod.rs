// A small SSM simulator for running compiled programs in tests.
//
// Memory is word-addressed by byte address. The data segment starts at 0
// (the data pointer), the heap above it, and the stack grows down from
// STACK_TOP. Heap arrays are laid out as `[length, elem0, elem1, ...]`.

#![allow(dead_code)]

use std::collections::HashMap;

use lplc::compile_source;
use lplc::compiler::instructions::{Assembly, Instruction, Syscall};
use lplc::config::CompilerConfig;

const HEAP_BASE: i32 = 0x1_0000;
const STACK_TOP: i32 = 0x10_0000;
const STEP_LIMIT: usize = 1_000_000;

pub struct Machine<'a> {
    code: &'a [Instruction],
    word_size: i32,
    code_labels: HashMap<&'a str, usize>,
    data_labels: HashMap<&'a str, i32>,
    memory: HashMap<i32, i32>,
    heap: i32,
    sp: i32,
    fp: i32,
    pc: usize,
    /// Stack depth before each active call pushed its arguments
    call_depths: Vec<usize>,
    pub output: String,
}

impl<'a> Machine<'a> {
    pub fn new(asm: &'a Assembly, word_size: i32) -> Self {
        let code = asm.instructions();
        let mut code_labels = HashMap::new();
        let mut data_labels = HashMap::new();
        let mut next_word = 0;

        for (index, instruction) in code.iter().enumerate() {
            match instruction {
                Instruction::Label(label) => {
                    code_labels.insert(label.as_str(), index);
                }
                Instruction::Word { label, .. } => {
                    data_labels.insert(label.as_str(), next_word);
                    next_word += word_size;
                }
                _ => {}
            }
        }

        let mut memory = HashMap::new();
        for instruction in code {
            if let Instruction::Word { label, value } = instruction {
                memory.insert(data_labels[label.as_str()], *value);
            }
        }

        Machine {
            code,
            word_size,
            code_labels,
            data_labels,
            memory,
            heap: HEAP_BASE,
            sp: STACK_TOP,
            fp: STACK_TOP,
            pc: 0,
            call_depths: Vec::new(),
            output: String::new(),
        }
    }

    /// Number of words currently on the stack
    pub fn depth(&self) -> usize {
        ((STACK_TOP - self.sp) / self.word_size) as usize
    }

    /// Value of a data word such as `$v_x`
    pub fn global(&self, label: &str) -> i32 {
        self.read(self.data_labels[label])
    }

    fn read(&self, address: i32) -> i32 {
        self.memory.get(&address).copied().unwrap_or(0)
    }

    fn push(&mut self, value: i32) {
        self.sp -= self.word_size;
        self.memory.insert(self.sp, value);
    }

    fn pop(&mut self) -> Result<i32, String> {
        if self.sp >= STACK_TOP {
            return Err(format!("stack underflow at instruction {}", self.pc));
        }
        let value = self.read(self.sp);
        self.sp += self.word_size;
        Ok(value)
    }

    fn jump_target(&self, label: &str) -> Result<usize, String> {
        self.code_labels
            .get(label)
            .copied()
            .ok_or_else(|| format!("jump to unknown label {}", label))
    }

    fn data_address(&self, label: &str) -> Result<i32, String> {
        self.data_labels
            .get(label)
            .copied()
            .ok_or_else(|| format!("unknown data word {}", label))
    }

    fn allocate(&mut self, dims: &[i32]) -> Result<i32, String> {
        let len = dims[0];
        if len < 0 {
            return Err(format!("negative array size {}", len));
        }
        let reference = self.heap;
        self.heap += (len + 1) * self.word_size;
        self.memory.insert(reference, len);
        if dims.len() > 1 {
            for i in 0..len {
                let inner = self.allocate(&dims[1..])?;
                self.memory.insert(reference + (i + 1) * self.word_size, inner);
            }
        }
        Ok(reference)
    }

    /// Run until `halt`
    pub fn run(&mut self) -> Result<(), String> {
        let code = self.code;
        for _ in 0..STEP_LIMIT {
            let instruction = code
                .get(self.pc)
                .ok_or_else(|| format!("ran off the end of the code at {}", self.pc))?;
            let mut next = self.pc + 1;

            match instruction {
                Instruction::Push(v) => self.push(*v),
                Instruction::GetFp => self.push(self.fp),
                Instruction::GetDp => self.push(0),
                Instruction::Load => {
                    let address = self.pop()?;
                    self.push(self.read(address));
                }
                Instruction::Store => {
                    let value = self.pop()?;
                    let address = self.pop()?;
                    self.memory.insert(address, value);
                }
                Instruction::LoadI(label) => {
                    let address = self.data_address(label)?;
                    self.push(self.read(address));
                }
                Instruction::StoreI(label) => {
                    let address = self.data_address(label)?;
                    let value = self.pop()?;
                    self.memory.insert(address, value);
                }
                Instruction::Add | Instruction::Sub | Instruction::Mul | Instruction::Div => {
                    let b = self.pop()?;
                    let a = self.pop()?;
                    let result = match instruction {
                        Instruction::Add => a.wrapping_add(b),
                        Instruction::Sub => a.wrapping_sub(b),
                        Instruction::Mul => a.wrapping_mul(b),
                        _ if b == 0 => return Err("division by zero".to_string()),
                        _ => a.wrapping_div(b),
                    };
                    self.push(result);
                }
                Instruction::TestZ => {
                    let v = self.pop()?;
                    self.push((v == 0) as i32);
                }
                Instruction::TestN => {
                    let v = self.pop()?;
                    self.push((v < 0) as i32);
                }
                Instruction::Jump(label) => next = self.jump_target(label)?,
                Instruction::JumpIfZero(label) => {
                    if self.pop()? == 0 {
                        next = self.jump_target(label)?;
                    }
                }
                Instruction::Call(label) => {
                    let argc = self.pop()?;
                    let before = self.depth() - argc as usize;
                    self.call_depths.push(before);
                    self.push(next as i32);
                    self.push(self.fp);
                    self.fp = self.sp;
                    next = self.jump_target(label)?;
                }
                Instruction::Ret => {
                    let cleanup = self.pop()?;
                    let value = self.pop()?;
                    let saved_fp = self.read(self.fp);
                    let return_address = self.read(self.fp + self.word_size);
                    self.sp += (cleanup + 2) * self.word_size;
                    self.fp = saved_fp;
                    self.push(value);
                    next = return_address as usize;

                    let before = self.call_depths.pop().ok_or("ret without a call")?;
                    if self.depth() != before + 1 {
                        return Err(format!(
                            "call returned with stack depth {}, expected {}",
                            self.depth(),
                            before + 1
                        ));
                    }
                }
                Instruction::Halt => return Ok(()),
                Instruction::ArrayIndex => {
                    let index = self.pop()?;
                    let reference = self.pop()?;
                    if reference == 0 {
                        return Err("indexing a null array".to_string());
                    }
                    let len = self.read(reference);
                    if index < 0 || index >= len {
                        return Err(format!("index {} out of bounds for length {}", index, len));
                    }
                    self.push(reference + (index + 1) * self.word_size);
                }
                Instruction::ArrayLength => {
                    let reference = self.pop()?;
                    if reference == 0 {
                        return Err("length of a null array".to_string());
                    }
                    self.push(self.read(reference));
                }
                Instruction::NewArray(count) => {
                    let mut dims = vec![0; *count];
                    for dim in dims.iter_mut().rev() {
                        *dim = self.pop()?;
                    }
                    let reference = self.allocate(&dims)?;
                    self.push(reference);
                }
                Instruction::Syscall(Syscall::OutDec) => {
                    let v = self.pop()?;
                    self.output.push_str(&v.to_string());
                }
                Instruction::Syscall(Syscall::OutChar) => {
                    let v = self.pop()?;
                    self.output.push(char::from_u32(v as u32).unwrap_or('?'));
                }
                Instruction::Label(_) => {}
                Instruction::DataSegment | Instruction::Word { .. } => {
                    return Err("executed the data segment".to_string());
                }
            }

            self.pc = next;
        }

        Err("step limit exceeded".to_string())
    }
}

pub fn compile(source: &str) -> Assembly {
    compile_source(source, &CompilerConfig::default()).expect("Compilation failed")
}

/// Compile and run `source`, returning its output and the final stack depth
pub fn run(source: &str) -> (String, usize) {
    let asm = compile(source);
    let mut machine = Machine::new(&asm, lplc::config::DEFAULT_WORD_SIZE);
    machine.run().expect("Execution failed");
    (machine.output.clone(), machine.depth())
}
