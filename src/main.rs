// SPDX-License-Identifier: BSD-3-CLAUSE
fn main() {
    signalmatch::cli::main()
}
