//! Unsigned invoke transactions for reading native contract state.
//!
//! Reads go through pre-execution: the node runs the transaction against
//! current state and returns the result without committing anything, so
//! the transaction needs no signature and no gas.

/// Address of the ONT ID native contract.
pub const ONT_ID_CONTRACT: [u8; 20] = [
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x03,
];

pub const ONT_ID_CONTRACT_VERSION: u8 = 0;

const NATIVE_INVOKE_NAME: &str = "Ontology.Native.Invoke";

const TX_VERSION: u8 = 0;
const TX_TYPE_INVOKE: u8 = 0xd1;

/// NeoVM opcodes used by native invocation scripts.
mod opcode {
    pub const PUSH0: u8 = 0x00;
    pub const PUSHBYTES75: u8 = 0x4b;
    pub const PUSHDATA1: u8 = 0x4c;
    pub const PUSHDATA2: u8 = 0x4d;
    pub const PUSHDATA4: u8 = 0x4e;
    pub const PUSHM1: u8 = 0x4f;
    pub const PUSH1: u8 = 0x51;
    pub const SYSCALL: u8 = 0x68;
    pub const DUPFROMALTSTACK: u8 = 0x6a;
    pub const TOALTSTACK: u8 = 0x6b;
    pub const FROMALTSTACK: u8 = 0x6c;
    pub const SWAP: u8 = 0x7c;
    pub const NEWSTRUCT: u8 = 0xc6;
    pub const APPEND: u8 = 0xc8;
}

/// Incrementally assembles a NeoVM script.
#[derive(Debug, Default)]
pub struct ScriptBuilder {
    buf: Vec<u8>,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, op: u8) -> &mut Self {
        self.buf.push(op);
        self
    }

    pub fn push_bytes(&mut self, data: &[u8]) -> &mut Self {
        let len = data.len();
        if len < opcode::PUSHBYTES75 as usize {
            self.buf.push(len as u8);
        } else if len < 0x100 {
            self.buf.push(opcode::PUSHDATA1);
            self.buf.push(len as u8);
        } else if len < 0x10000 {
            self.buf.push(opcode::PUSHDATA2);
            self.buf.extend_from_slice(&(len as u16).to_le_bytes());
        } else {
            self.buf.push(opcode::PUSHDATA4);
            self.buf.extend_from_slice(&(len as u32).to_le_bytes());
        }
        self.buf.extend_from_slice(data);
        self
    }

    pub fn push_integer(&mut self, value: i64) -> &mut Self {
        match value {
            -1 => self.emit(opcode::PUSHM1),
            0 => self.emit(opcode::PUSH0),
            1..=16 => self.emit(opcode::PUSH1 - 1 + value as u8),
            _ => {
                let bytes = minimal_le_bytes(value);
                self.push_bytes(&bytes)
            }
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Shortest little-endian two's complement encoding of `value`.
fn minimal_le_bytes(value: i64) -> Vec<u8> {
    let mut bytes = value.to_le_bytes().to_vec();
    while bytes.len() > 1 {
        let last = bytes[bytes.len() - 1];
        let prev_sign = bytes[bytes.len() - 2] & 0x80;
        if (last == 0x00 && prev_sign == 0) || (last == 0xff && prev_sign != 0) {
            bytes.pop();
        } else {
            break;
        }
    }
    bytes
}

/// Builds the script that calls `method` on a native contract.
///
/// Parameters are packed into a struct the way native contracts expect.
pub fn build_native_invoke_code(
    contract: &[u8; 20],
    version: u8,
    method: &str,
    params: &[&[u8]],
) -> Vec<u8> {
    let mut builder = ScriptBuilder::new();
    builder
        .push_integer(0)
        .emit(opcode::NEWSTRUCT)
        .emit(opcode::TOALTSTACK);
    for param in params {
        builder
            .push_bytes(param)
            .emit(opcode::DUPFROMALTSTACK)
            .emit(opcode::SWAP)
            .emit(opcode::APPEND);
    }
    builder
        .emit(opcode::FROMALTSTACK)
        .push_bytes(method.as_bytes())
        .push_bytes(contract)
        .push_integer(i64::from(version))
        .emit(opcode::SYSCALL)
        .push_bytes(NATIVE_INVOKE_NAME.as_bytes());
    builder.into_bytes()
}

fn write_var_uint(buf: &mut Vec<u8>, value: u64) {
    if value < 0xfd {
        buf.push(value as u8);
    } else if value <= 0xffff {
        buf.push(0xfd);
        buf.extend_from_slice(&(value as u16).to_le_bytes());
    } else if value <= 0xffff_ffff {
        buf.push(0xfe);
        buf.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        buf.push(0xff);
        buf.extend_from_slice(&value.to_le_bytes());
    }
}

/// An unsigned invoke transaction.
#[derive(Debug, Clone)]
pub struct InvokeTransaction {
    pub nonce: u32,
    pub gas_price: u64,
    pub gas_limit: u64,
    pub payer: [u8; 20],
    pub code: Vec<u8>,
}

impl InvokeTransaction {
    /// A zero-gas transaction suitable for pre-execution.
    pub fn pre_exec(code: Vec<u8>) -> Self {
        Self {
            nonce: rand::random(),
            gas_price: 0,
            gas_limit: 0,
            payer: [0u8; 20],
            code,
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.code.len() + 48);
        buf.push(TX_VERSION);
        buf.push(TX_TYPE_INVOKE);
        buf.extend_from_slice(&self.nonce.to_le_bytes());
        buf.extend_from_slice(&self.gas_price.to_le_bytes());
        buf.extend_from_slice(&self.gas_limit.to_le_bytes());
        buf.extend_from_slice(&self.payer);
        write_var_uint(&mut buf, self.code.len() as u64);
        buf.extend_from_slice(&self.code);
        // attributes
        write_var_uint(&mut buf, 0);
        // signatures
        write_var_uint(&mut buf, 0);
        buf
    }
}
