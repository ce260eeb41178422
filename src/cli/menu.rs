use crate::core::Blockchain;
use crate::error::Result;
use crate::wallet::Wallet;
use std::io::{BufRead, Write};

const SEPARATOR: &str = "----------------------------------------";

const MENU: &str = "What do you want to do?
1. Mine pending transactions
2. Create transaction
3. Check balance
4. Show chain
5. Exit";

/// Interactive front end over one ledger and one wallet. Both are handed in by
/// the caller; the menu only reads them and triggers their operations.
pub struct LedgerMenu<R, W> {
    blockchain: Blockchain,
    wallet: Wallet,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LedgerMenu<R, W> {
    pub fn new(blockchain: Blockchain, wallet: Wallet, input: R, output: W) -> Self {
        Self {
            blockchain,
            wallet,
            input,
            output,
        }
    }

    pub fn blockchain(&self) -> &Blockchain {
        &self.blockchain
    }

    /// Loop until the user exits or input runs out
    pub fn run(&mut self) -> Result<()> {
        writeln!(self.output, "Your address: {}", self.wallet.get_public_key())?;
        loop {
            let Some(answer) = self.prompt(&format!("{MENU}\n"))? else {
                return Ok(());
            };

            match answer.as_str() {
                "1" => self.mine_pending_transactions()?,
                "2" => self.create_transaction()?,
                "3" => self.check_balance()?,
                "4" => self.show_chain()?,
                "5" => return Ok(()),
                _ => writeln!(self.output, "Invalid option")?,
            }

            writeln!(self.output, "\n{SEPARATOR}\n")?;
        }
    }

    fn mine_pending_transactions(&mut self) -> Result<()> {
        writeln!(self.output, "Mining...")?;
        let reward_address = self.wallet.get_public_key().to_string();
        let block = self.blockchain.mine(&reward_address)?;
        writeln!(self.output, "Mining completed: {}", block.get_hash())?;
        Ok(())
    }

    fn create_transaction(&mut self) -> Result<()> {
        let Some(to_address) = self.prompt("Enter the recipient address: ")? else {
            return Ok(());
        };
        if to_address.is_empty() {
            writeln!(self.output, "Invalid address")?;
            return Ok(());
        }

        let Some(amount) = self.prompt("Enter the amount: ")? else {
            return Ok(());
        };
        let amount = match amount.parse::<u64>() {
            Ok(amount) if amount > 0 => amount,
            _ => {
                writeln!(self.output, "Invalid amount")?;
                return Ok(());
            }
        };

        let balance = self.blockchain.balance_of(self.wallet.get_public_key());
        if i128::from(amount) > balance {
            writeln!(self.output, "Insufficient balance for this transaction")?;
            return Ok(());
        }

        let transaction = self.wallet.create_transaction(&to_address, amount)?;
        match self.blockchain.submit_transaction(transaction) {
            Ok(()) => writeln!(self.output, "Transaction created")?,
            Err(e) => writeln!(self.output, "Transaction rejected: {e}")?,
        }
        Ok(())
    }

    fn check_balance(&mut self) -> Result<()> {
        let balance = self.blockchain.balance_of(self.wallet.get_public_key());
        writeln!(self.output, "The balance is {balance}")?;
        Ok(())
    }

    fn show_chain(&mut self) -> Result<()> {
        for (index, block) in self.blockchain.get_blocks().iter().enumerate() {
            writeln!(self.output, "\nBlock {index}")?;
            writeln!(self.output, "  hash:          {}", block.get_hash())?;
            writeln!(self.output, "  previous hash: {}", block.get_previous_hash())?;
            writeln!(self.output, "  timestamp:     {}", block.get_timestamp())?;
            writeln!(self.output, "  nonce:         {}", block.get_nonce())?;

            if block.get_transactions().is_empty() {
                continue;
            }

            writeln!(self.output, "Transactions for block {index}")?;
            for tx in block.get_transactions() {
                writeln!(
                    self.output,
                    "  - from: {}",
                    tx.get_from_address().unwrap_or("<mining reward>")
                )?;
                writeln!(self.output, "    to: {}", tx.get_to_address())?;
                writeln!(self.output, "    amount: {}", tx.get_amount())?;
                writeln!(self.output, "    signature: {}", tx.get_signature())?;
            }
        }
        Ok(())
    }

    /// `None` once input is exhausted
    fn prompt(&mut self, question: &str) -> Result<Option<String>> {
        write!(self.output, "{question}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerSettings;
    use std::io::Cursor;

    fn run_menu(script: &str) -> (LedgerMenu<Cursor<Vec<u8>>, Vec<u8>>, String) {
        let blockchain = Blockchain::with_settings(&LedgerSettings {
            difficulty: 1,
            ..Default::default()
        })
        .unwrap();
        let mut menu = LedgerMenu::new(
            blockchain,
            Wallet::new(),
            Cursor::new(script.as_bytes().to_vec()),
            Vec::new(),
        );
        menu.run().unwrap();
        let output = String::from_utf8(menu.output.clone()).unwrap();
        (menu, output)
    }

    #[test]
    fn test_mine_then_pay() {
        let (menu, output) = run_menu("1\n2\nbob\n20\n1\n3\n5\n");

        assert!(output.contains("Mining completed"));
        assert!(output.contains("Transaction created"));
        // 50 + 50 rewards minus the 20 paid to bob
        assert!(output.contains("The balance is 80"));
        assert_eq!(menu.blockchain().balance_of("bob"), 20);
    }

    #[test]
    fn test_rejects_bad_amounts_before_the_ledger() {
        let (menu, output) = run_menu("2\nbob\nabc\n2\nbob\n0\n2\nbob\n10\n5\n");

        assert_eq!(output.matches("Invalid amount").count(), 2);
        assert!(output.contains("Insufficient balance for this transaction"));
        assert!(menu.blockchain().get_pending_transactions().is_empty());
    }

    #[test]
    fn test_invalid_option_and_show_chain() {
        let (_, output) = run_menu("9\n4\n");

        assert!(output.contains("Invalid option"));
        assert!(output.contains("Block 0"));
        assert!(output.contains("previous hash: 0"));
    }
}
