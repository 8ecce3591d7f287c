use crate::memory::{Flag, Registers};
use crate::runtime::Fault;

/// Operations routed through the arithmetic-logic unit.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AluOp {
    Add,
    Sub,
    Mul,
    Div,
    Cmp,
}

impl AluOp {
    pub const ADD: u8 = 0b1010_0000;
    pub const SUB: u8 = 0b1010_0001;
    pub const MUL: u8 = 0b1010_0010;
    pub const DIV: u8 = 0b1010_0011;
    pub const CMP: u8 = 0b1010_0111;

    pub fn decode(byte: u8) -> Option<AluOp> {
        match byte {
            Self::ADD => Some(AluOp::Add),
            Self::SUB => Some(AluOp::Sub),
            Self::MUL => Some(AluOp::Mul),
            Self::DIV => Some(AluOp::Div),
            Self::CMP => Some(AluOp::Cmp),
            _ => None,
        }
    }

    pub fn encode(self) -> u8 {
        match self {
            AluOp::Add => Self::ADD,
            AluOp::Sub => Self::SUB,
            AluOp::Mul => Self::MUL,
            AluOp::Div => Self::DIV,
            AluOp::Cmp => Self::CMP,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            AluOp::Add => "ADD",
            AluOp::Sub => "SUB",
            AluOp::Mul => "MUL",
            AluOp::Div => "DIV",
            AluOp::Cmp => "CMP",
        }
    }
}

/// Apply `op` to registers `a` and `b`.
///
/// Arithmetic results are written back to `a`; `CMP` only touches `flag`.
pub fn execute(
    op: AluOp,
    reg: &mut Registers,
    flag: &mut Flag,
    a: u8,
    b: u8,
) -> Result<(), Fault> {
    let lhs = reg.get(a)?;
    let rhs = reg.get(b)?;
    let res = match op {
        AluOp::Add => lhs.wrapping_add(rhs),
        AluOp::Sub => lhs.wrapping_sub(rhs),
        AluOp::Mul => lhs.wrapping_mul(rhs),
        AluOp::Div => lhs.checked_div(rhs).ok_or(Fault::DivisionByZero)?,
        AluOp::Cmp => {
            *flag = Flag::compare(lhs, rhs);
            return Ok(());
        }
    };
    reg.set(a, res)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(op: AluOp, x: u8, y: u8) -> (Result<(), Fault>, Registers, Flag) {
        let mut reg = Registers::new();
        let mut flag = Flag::Uninit;
        reg.set(0, x).unwrap();
        reg.set(1, y).unwrap();
        let res = execute(op, &mut reg, &mut flag, 0, 1);
        (res, reg, flag)
    }

    #[test]
    fn arithmetic_wraps() {
        #[rustfmt::skip]
        let cases = [
            // (op, x, y, expected)
            (AluOp::Add, 8, 9, 17),
            (AluOp::Add, 200, 100, 44),
            (AluOp::Add, 255, 1, 0),
            (AluOp::Sub, 9, 8, 1),
            (AluOp::Sub, 0, 1, 255),
            (AluOp::Mul, 8, 9, 72),
            (AluOp::Mul, 16, 16, 0),
            (AluOp::Mul, 20, 13, 4),
            (AluOp::Div, 72, 9, 8),
            (AluOp::Div, 7, 2, 3),
            (AluOp::Div, 0, 5, 0),
        ];
        for (op, x, y, expected) in cases {
            let (res, reg, flag) = run(op, x, y);
            assert_eq!(res, Ok(()));
            assert_eq!(reg.get(0), Ok(expected), "{} {x}, {y}", op.mnemonic());
            assert_eq!(reg.get(1), Ok(y));
            assert_eq!(flag, Flag::Uninit);
        }
    }

    #[test]
    fn add_matches_modular_sum() {
        for x in (0..=255u8).step_by(17) {
            for y in (0..=255u8).step_by(23) {
                let (_, reg, _) = run(AluOp::Add, x, y);
                assert_eq!(reg.get(0), Ok(((x as u16 + y as u16) % 256) as u8));
            }
        }
    }

    #[test]
    fn divide_by_zero() {
        let (res, reg, _) = run(AluOp::Div, 9, 0);
        assert_eq!(res, Err(Fault::DivisionByZero));
        assert_eq!(reg.get(0), Ok(9));
    }

    #[test]
    fn compare() {
        assert_eq!(run(AluOp::Cmp, 5, 5).2, Flag::E);
        assert_eq!(run(AluOp::Cmp, 7, 3).2, Flag::G);
        assert_eq!(run(AluOp::Cmp, 2, 9).2, Flag::L);
        // Operands untouched
        let (_, reg, _) = run(AluOp::Cmp, 7, 3);
        assert_eq!(reg.get(0), Ok(7));
    }

    #[test]
    fn compare_greater_and_less_are_not_equality() {
        // G and L were once derived from `==`, making them mirror E
        let (_, _, flag) = run(AluOp::Cmp, 4, 4);
        assert_eq!(flag.bits(), 0b001);
        let (_, _, flag) = run(AluOp::Cmp, 9, 4);
        assert_eq!(flag.bits(), 0b010);
        let (_, _, flag) = run(AluOp::Cmp, 4, 9);
        assert_eq!(flag.bits(), 0b100);
    }

    #[test]
    fn compare_resets_previous_result() {
        let mut reg = Registers::new();
        let mut flag = Flag::L;
        reg.set(2, 1).unwrap();
        reg.set(3, 1).unwrap();
        execute(AluOp::Cmp, &mut reg, &mut flag, 2, 3).unwrap();
        assert_eq!(flag, Flag::E);
    }

    #[test]
    fn bad_register_operand() {
        let mut reg = Registers::new();
        let mut flag = Flag::Uninit;
        assert!(matches!(
            execute(AluOp::Add, &mut reg, &mut flag, 0, 9),
            Err(Fault::OutOfBounds { address: 9, .. })
        ));
    }
}
